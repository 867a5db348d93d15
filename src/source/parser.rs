//! Generic parsing of line-oriented `key value` stat files.
//!
//! Files such as `/proc/meminfo` or `/proc/vmstat` carry one counter per line,
//! optionally followed by a unit:
//!
//! ```text
//! MemTotal:       16318272 kB
//! MemFree:         1203940 kB
//! ```
//!
//! Implementors of [`KeyValueStat`] only declare which keys they care about
//! and how each parsed value is stored; the trait drives the line loop.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use hostmon::source::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Swap {
//!     total: u64,
//!     free: u64,
//! }
//!
//! static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut Swap, u64)>> = LazyLock::new(|| {
//!     let mut m: HashMap<&'static str, fn(&mut Swap, u64)> = HashMap::new();
//!     m.insert("SwapTotal", |s, v| s.total = v);
//!     m.insert("SwapFree", |s, v| s.free = v);
//!     m
//! });
//!
//! impl KeyValueStat for Swap {
//!     const SKIP_LINES: usize = 0;
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &HANDLERS
//!     }
//! }
//!
//! let data = "SwapTotal: 2048 kB\nSwapFree: 1024 kB\n";
//! let swap = Swap::from_reader(&mut data.as_bytes()).unwrap();
//! assert_eq!(swap.total, 2048);
//! assert_eq!(swap.free, 1024);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// A stat file made of `key value [unit]` lines.
///
/// A trailing `:` on the key is ignored, so `MemTotal:` matches the handler
/// registered for `MemTotal`.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// Number of header lines to skip before parsing begins.
    const SKIP_LINES: usize;

    /// If `false`, a key seen twice is a [`StatParseError::DuplicateField`] and
    /// parsing stops early once every known key has been seen.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Known keys mapped to the function storing their value.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses the whole reader into `Self`.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading fails, or a parse error if a known
    /// key carries a non-numeric value or repeats while duplicates are disallowed.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        for _ in 0..Self::SKIP_LINES {
            buf.read_line(&mut line)?;
            line.clear();
        }

        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                Self::parse_and_set(
                    key.trim_end_matches(':'),
                    val,
                    &mut stat,
                    lineno,
                    handlers,
                    &mut seen_keys,
                )?;
            }
            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == handlers.len() {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }

    /// Applies one `key`/`val` pair through its handler.
    fn parse_and_set(
        key: &str,
        val: &str,
        stat: &mut Self,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> Result<(), StatParseError> {
        // Keys without a handler are ignored.
        let Some((k, handler)) = handlers.get_key_value(key) else {
            return Ok(());
        };
        let parsed = val
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidKeyValue {
                key: key.to_string(),
                value: val.to_string(),
                line: lineno,
                source,
            })?;
        if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(k) {
            return Err(StatParseError::DuplicateField {
                field: key.to_string(),
                line: lineno,
            });
        }
        handler(stat, parsed);
        Ok(())
    }
}
