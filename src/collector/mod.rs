//! Units of measurement sampled by the [`Monitor`](crate::Monitor).
//!
//! Every [`Collector`] has a fixed name, an optional one-time
//! [`setup`](Collector::setup) and a repeatable [`sample`](Collector::sample)
//! that turns raw readings from a [`MetricSource`](crate::source::MetricSource)
//! into a [`Sample`].
//!
//! | name      | sample                                          |
//! |-----------|-------------------------------------------------|
//! | `cpus`    | per-CPU percent of time in state                |
//! | `loadavg` | 1/5/15 minute load averages                     |
//! | `mem`     | virtual memory statistics                       |
//! | `net_io`  | per-interface counter deltas since last sample  |
//!
//! Collectors are instantiated by name through the [`registry`].

mod cpu;
mod delta;
mod load;
mod memory;
mod net_io;
pub mod registry;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::source::{CpuTimesPercent, LoadAverage, SourceError, VirtualMemory};

pub use cpu::CpuTime;
pub use delta::{CounterDelta, Counters, Deltas};
pub use load::LoadAvg;
pub use memory::Mem;
pub use net_io::NetIo;
pub use registry::{Constructor, lookup, names};

/// One structured value produced by a single [`Collector::sample`] call.
///
/// Serializes untagged, i.e. as the bare list or record of the variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sample {
    Cpus(Vec<CpuTimesPercent>),
    LoadAvg(LoadAverage),
    Mem(VirtualMemory),
    NetIo(BTreeMap<String, Deltas>),
}

/// A named, repeatable measurement.
///
/// Collectors are moved onto the sampling thread, hence `Send`. They are
/// only ever called from one thread at a time, so no internal locking is needed.
pub trait Collector: Send {
    /// Registry key and time series key of this collector.
    fn name(&self) -> &'static str;

    /// One-time initialization, called exactly once before the first sample.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the initial reading cannot be taken.
    fn setup(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Produces the current sample.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the metric source cannot be read.
    fn sample(&mut self) -> Result<Sample, SourceError>;
}
