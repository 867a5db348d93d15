use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{CollectionFailure, Shared, TimeSeries};
use crate::collector::Collector;

/// Current wall-clock time in UNIX epoch seconds.
///
/// A clock set before the epoch reads as `0`.
pub(super) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// The collectors together with the state they report into.
///
/// Lives in the [`Monitor`](super::Monitor) until started, then moves onto
/// the sampling thread, which becomes its only user.
pub(super) struct Sampler {
    pub(super) collectors: Vec<Box<dyn Collector>>,
    pub(super) series: Arc<TimeSeries>,
    pub(super) shared: Arc<Shared>,
}

impl Sampler {
    /// Samples every collector once, in configured order, recording under `timestamp`.
    ///
    /// A failing collector is logged and remembered; the remaining collectors
    /// still run.
    pub(super) fn tick(&mut self, timestamp: u64) {
        for collector in self.collectors.iter_mut() {
            let name = collector.name();
            match collector.sample() {
                Ok(sample) => {
                    log::debug!(target: "monitor", "collected {name}: {sample:?}");
                    self.series.record(name, timestamp, sample);
                }
                Err(err) => {
                    log::warn!(
                        target: "monitor",
                        "failed collecting sample: collector={}, error={}",
                        name,
                        err
                    );
                    self.shared.record_failure(CollectionFailure {
                        collector: name,
                        timestamp,
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    /// Runs ticks until the running flag drops or a stop is signalled.
    ///
    /// The stop channel doubles as the interval timer, so a stop request cuts
    /// the sleep short; a tick in progress always completes.
    pub(super) fn run(mut self, interval: Duration, stop: Receiver<()>) {
        while self.shared.running.load(Ordering::Acquire) {
            self.tick(unix_timestamp());
            match stop.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::info!(target: "monitor", "ended monitoring");
    }
}
