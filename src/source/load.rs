use std::io::BufRead;

use serde::Serialize;

use super::StatParseError;

/// System load averages over 1, 5 and 15 minutes.
///
/// Serializes with the keys `"1"`, `"5"` and `"15"`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LoadAverage {
    #[serde(rename = "1")]
    pub one: f64,
    #[serde(rename = "5")]
    pub five: f64,
    #[serde(rename = "15")]
    pub fifteen: f64,
}

impl LoadAverage {
    /// Parses a `/proc/loadavg` line, e.g. `0.00 0.01 0.05 1/234 5678`.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::MissingField`] if fewer than three values are present,
    /// or [`StatParseError::InvalidFloat`] if one of them is not a number.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let mut parts = line.split_whitespace();

        let mut next = |field: &'static str| -> Result<f64, StatParseError> {
            let raw = parts.next().ok_or(StatParseError::MissingField { field })?;
            raw.parse().map_err(|source| StatParseError::InvalidFloat {
                value: raw.to_string(),
                source,
            })
        };

        Ok(Self {
            one: next("1")?,
            five: next("5")?,
            fifteen: next("15")?,
        })
    }
}
