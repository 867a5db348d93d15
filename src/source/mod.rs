//! Raw host metric acquisition.
//!
//! Collectors never touch the operating system themselves; they consume a
//! [`MetricSource`], which answers "what is the current raw value" for each
//! metric family. [`ProcSource`] is the Linux implementation reading procfs,
//! other platforms or test doubles plug in by implementing the trait.
//!
//! # Supported files
//!
//! - `/proc/stat` for per-CPU time in state
//! - `/proc/loadavg` for the 1/5/15 minute load averages
//! - `/proc/meminfo` for virtual memory statistics
//! - `/proc/net/dev` for per-interface cumulative counters

mod cpu;
mod error;
mod load;
mod memory;
mod net;
mod parser;
mod procfs;

use std::collections::HashMap;

pub use cpu::{CpuTimes, CpuTimesPercent};
pub use error::{Result, SourceError, StatParseError};
pub use load::LoadAverage;
pub use memory::{MemInfo, VirtualMemory};
pub use net::NetIoCounters;
pub use parser::KeyValueStat;
pub use procfs::ProcSource;

/// Provider of raw host metrics.
///
/// Shared between collectors as `Arc<dyn MetricSource>`, hence `Send + Sync`.
pub trait MetricSource: Send + Sync {
    /// Percent of time each logical CPU spent per state since the previous call.
    fn cpu_times_percent(&self) -> Result<Vec<CpuTimesPercent>>;

    fn load_average(&self) -> Result<LoadAverage>;

    fn virtual_memory(&self) -> Result<VirtualMemory>;

    /// Cumulative counters keyed by interface name.
    fn net_io_counters(&self) -> Result<HashMap<String, NetIoCounters>>;
}
