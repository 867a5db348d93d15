//! Per-CPU time accounting from `/proc/stat`.
//!
//! `/proc/stat` reports cumulative clock ticks per CPU state. The aggregate
//! `cpu` line is skipped; each `cpuN` line yields one [`CpuTimes`]. Turning two
//! consecutive readings into percentages is done by [`CpuTimes::percent_since`].

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::Serialize;

use super::StatParseError;

/// Cumulative ticks spent by one logical CPU in each state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

/// Share of elapsed time one logical CPU spent in each state, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CpuTimesPercent {
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
    pub steal: f64,
    pub guest: f64,
    pub guest_nice: f64,
}

impl CpuTimes {
    fn fields(&self) -> [u64; 10] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
    }

    /// Total ticks. Guest time is already included in user/nice by the kernel.
    pub fn total(&self) -> u64 {
        self.fields()[..8].iter().sum()
    }

    /// Computes how the ticks elapsed between `prev` and `self` split across states.
    ///
    /// Every field is rounded to one decimal and clamped to `0.0..=100.0`. When no
    /// ticks elapsed at all (or the counters went backwards), every field is zero.
    pub fn percent_since(&self, prev: &CpuTimes) -> CpuTimesPercent {
        let elapsed = self.total().saturating_sub(prev.total());
        let cur = self.fields();
        let old = prev.fields();
        let pct = |i: usize| {
            if elapsed == 0 {
                return 0.0;
            }
            let delta = cur[i].saturating_sub(old[i]) as f64;
            let value = (delta / elapsed as f64 * 100.0 * 10.0).round() / 10.0;
            value.clamp(0.0, 100.0)
        };

        CpuTimesPercent {
            user: pct(0),
            nice: pct(1),
            system: pct(2),
            idle: pct(3),
            iowait: pct(4),
            irq: pct(5),
            softirq: pct(6),
            steal: pct(7),
            guest: pct(8),
            guest_nice: pct(9),
        }
    }

    /// Parses every `cpuN` line of a `/proc/stat` formatted reader, keyed by `N`.
    ///
    /// Offline CPUs have no line, so the keys may have gaps. Missing trailing
    /// columns (older kernels) default to zero.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::InvalidKeyValue`] if a tick counter is not numeric.
    pub fn per_cpu_from_reader<R: BufRead>(
        buf: &mut R,
    ) -> Result<BTreeMap<usize, Self>, StatParseError> {
        let mut cpus = BTreeMap::new();
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let Some(label) = parts.next() {
                let index = label
                    .strip_prefix("cpu")
                    .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|n| n.parse::<usize>().ok());
                if let Some(index) = index {
                    cpus.insert(index, Self::from_fields(label, parts, lineno)?);
                }
            }
            line.clear();
        }

        Ok(cpus)
    }

    fn from_fields<'a>(
        label: &str,
        parts: impl Iterator<Item = &'a str>,
        lineno: usize,
    ) -> Result<Self, StatParseError> {
        let mut values = [0u64; 10];
        for (slot, raw) in values.iter_mut().zip(parts) {
            *slot = raw
                .parse()
                .map_err(|source| StatParseError::InvalidKeyValue {
                    key: label.to_string(),
                    value: raw.to_string(),
                    line: lineno,
                    source,
                })?;
        }
        let [
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        ] = values;
        Ok(Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &[u8] = b"\
cpu  400 0 200 1400 0 0 0 0 0 0
cpu0 100 0 50 350 0 0 0 0 0 0
cpu1 300 0 150 1050 0 0 0 0 0 0
intr 123456 0 0
ctxt 987654
cpu_unrelated 1 2 3
";

    #[test]
    fn test_parse_per_cpu_lines_only() {
        let cpus = CpuTimes::per_cpu_from_reader(&mut &STAT[..]).unwrap();
        assert_eq!(cpus.len(), 2);
        assert_eq!(cpus[&0].user, 100);
        assert_eq!(cpus[&0].idle, 350);
        assert_eq!(cpus[&1].system, 150);
    }

    #[test]
    fn test_parse_keys_by_cpu_number() {
        let data = b"cpu  2 0 0 2\ncpu0 1 0 0 1\ncpu2 7 0 0 1\n";
        let cpus = CpuTimes::per_cpu_from_reader(&mut &data[..]).unwrap();
        assert_eq!(cpus.keys().copied().collect::<Vec<_>>(), [0, 2]);
        assert_eq!(cpus[&2].user, 7);
    }

    #[test]
    fn test_parse_short_line_defaults_missing_columns() {
        let data = b"cpu0 10 20 30 40\n";
        let cpus = CpuTimes::per_cpu_from_reader(&mut &data[..]).unwrap();
        assert_eq!(cpus[&0].idle, 40);
        assert_eq!(cpus[&0].iowait, 0);
        assert_eq!(cpus[&0].guest_nice, 0);
    }

    #[test]
    fn test_parse_invalid_ticks() {
        let data = b"cpu  1 2 3 4\ncpu0 1 x 3 4\n";
        match CpuTimes::per_cpu_from_reader(&mut &data[..]).unwrap_err() {
            StatParseError::InvalidKeyValue {
                key, value, line, ..
            } => {
                assert_eq!(key, "cpu0");
                assert_eq!(value, "x");
                assert_eq!(line, 2);
            }
            other => panic!("expected InvalidKeyValue, got {other:?}"),
        }
    }

    #[test]
    fn test_percent_since_previous_reading() {
        let prev = CpuTimes {
            user: 100,
            system: 50,
            idle: 850,
            ..Default::default()
        };
        let cur = CpuTimes {
            user: 130,
            system: 60,
            idle: 910,
            ..Default::default()
        };
        let pct = cur.percent_since(&prev);
        assert_eq!(pct.user, 30.0);
        assert_eq!(pct.system, 10.0);
        assert_eq!(pct.idle, 60.0);
        assert_eq!(pct.iowait, 0.0);
    }

    #[test]
    fn test_percent_since_rounds_to_one_decimal() {
        let cur = CpuTimes {
            user: 1,
            idle: 2,
            ..Default::default()
        };
        let pct = cur.percent_since(&CpuTimes::default());
        assert_eq!(pct.user, 33.3);
        assert_eq!(pct.idle, 66.7);
    }

    #[test]
    fn test_percent_since_without_elapsed_ticks() {
        let t = CpuTimes {
            user: 5,
            idle: 5,
            ..Default::default()
        };
        assert_eq!(t.percent_since(&t), CpuTimesPercent::default());
    }
}
