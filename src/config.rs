//! Runtime configuration.
//!
//! [`MonitorConfig`] is what a [`Monitor`](crate::Monitor) needs; [`AgentConfig`]
//! adds what the `hostmon` binary needs around it. Both are read from the
//! environment:
//!
//! | Variable             | Meaning                                  | Default        |
//! |----------------------|------------------------------------------|----------------|
//! | `HOSTMON_COLLECTORS` | comma separated collector names          | all registered |
//! | `HOSTMON_INTERVAL`   | seconds between ticks                    | `5`            |
//! | `HOSTMON_RETENTION`  | max samples kept per collector           | unbounded      |
//! | `HOSTMON_DURATION`   | seconds to run before exiting            | until Ctrl-C   |
//! | `ROOTFS_MOUNT_PATH`  | root below which `proc/` is read         | `/`            |

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::collector::registry;
use crate::error::{Error, Result};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Collector names, sampled in this order.
    pub collectors: Vec<String>,
    pub interval: Duration,
    /// Maximum number of samples kept per collector; `None` keeps everything.
    pub retention: Option<NonZeroUsize>,
}

impl MonitorConfig {
    /// Samples `collectors` every five seconds. An empty list selects every
    /// registered collector.
    pub fn new(collectors: Vec<String>) -> Self {
        let collectors = if collectors.is_empty() {
            registry::names().map(str::to_string).collect()
        } else {
            collectors
        };
        Self {
            collectors,
            interval: DEFAULT_INTERVAL,
            retention: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retention(mut self, retention: Option<NonZeroUsize>) -> Self {
        self.retention = retention;
        self
    }
}

impl Default for MonitorConfig {
    /// Every registered collector, sampled every five seconds.
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub monitor: MonitorConfig,
    pub rootfs: PathBuf,
    /// How long to sample before exiting; `None` runs until interrupted.
    pub duration: Option<Duration>,
}

impl AgentConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable holds an unusable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable holds an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut monitor = match lookup("HOSTMON_COLLECTORS") {
            Some(raw) => MonitorConfig::new(
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            None => MonitorConfig::default(),
        };

        if let Some(raw) = lookup("HOSTMON_INTERVAL") {
            monitor.interval = parse_seconds("HOSTMON_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("HOSTMON_RETENTION") {
            let retention = raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|err| Error::InvalidConfig {
                    key: "HOSTMON_RETENTION",
                    value: raw.clone(),
                    reason: err.to_string(),
                })?;
            monitor.retention = Some(retention);
        }

        let duration = lookup("HOSTMON_DURATION")
            .map(|raw| parse_seconds("HOSTMON_DURATION", &raw))
            .transpose()?;

        let rootfs = lookup("ROOTFS_MOUNT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));

        Ok(Self {
            monitor,
            rootfs,
            duration,
        })
    }
}

/// Parses a strictly positive, finite number of seconds such as `0.5` or `10`.
fn parse_seconds(key: &'static str, raw: &str) -> Result<Duration> {
    let invalid = |reason: String| Error::InvalidConfig {
        key,
        value: raw.to_string(),
        reason,
    };
    let secs = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| invalid(err.to_string()))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid("expected a positive number of seconds".to_string()));
    }
    Duration::try_from_secs_f64(secs).map_err(|err| invalid(err.to_string()))
}
