//! Periodic sampling of a configured set of collectors on a background thread.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --setup()--> Ready --start()--> Running --stop()--> Stopping --> Stopped
//!                     |                   |
//!                 collect()          (thread panic) --> Failed
//! ```
//!
//! - [`Monitor::setup`] resolves every configured name through the
//!   [`registry`](crate::collector::registry), constructs the collector and runs
//!   its one-time setup. Valid entries are kept even if others fail.
//! - [`Monitor::start`] moves the collectors onto a dedicated thread and returns
//!   immediately. Each tick samples all collectors in order, records the results
//!   under the current UNIX second and sleeps for the configured interval.
//! - [`Monitor::stop`] never blocks. It interrupts the sleep, so the thread exits
//!   as soon as the tick in progress (if any) completes. [`Monitor::join`] waits
//!   for that to happen.
//!
//! # Failures
//!
//! A collector failing during a tick is logged, counted and exposed through
//! [`Monitor::last_error`]; the other collectors and later ticks carry on.
//! A panic on the sampling thread leaves the monitor in [`State::Failed`].

mod sampler;
mod series;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sampler::{Sampler, unix_timestamp};
pub use series::{Entry, TimeSeries};

use crate::collector::{Collector, Sample, registry};
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::source::MetricSource;

/// Lifecycle state of a [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Constructed, collectors not yet set up.
    #[default]
    Idle,
    /// Collectors set up, not sampling.
    Ready,
    Running,
    /// Stop requested, the thread has not exited yet.
    Stopping,
    Stopped,
    /// The sampling thread panicked.
    Failed,
}

/// A collector error observed during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFailure {
    pub collector: &'static str,
    /// Timestamp (in UNIX epoch seconds) of the failed tick.
    pub timestamp: u64,
    pub error: String,
}

/// State shared between the [`Monitor`] handle and its sampling thread.
#[derive(Debug, Default)]
struct Shared {
    running: AtomicBool,
    state: Mutex<State>,
    failures: AtomicU64,
    last_error: Mutex<Option<CollectionFailure>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn state(&self) -> State {
        *lock(&self.state)
    }

    fn set_state(&self, state: State) {
        *lock(&self.state) = state;
    }

    /// Moves to `to` only if currently in `from`.
    fn transition(&self, from: State, to: State) -> bool {
        let mut state = lock(&self.state);
        if *state == from {
            *state = to;
            true
        } else {
            false
        }
    }

    fn record_failure(&self, failure: CollectionFailure) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_error) = Some(failure);
    }

    fn last_error(&self) -> Option<CollectionFailure> {
        lock(&self.last_error).clone()
    }
}

/// Runs a set of collectors on a fixed interval and keeps their samples.
pub struct Monitor {
    config: MonitorConfig,
    source: Arc<dyn MetricSource>,
    names: Vec<&'static str>,
    sampler: Option<Sampler>,
    series: Arc<TimeSeries>,
    shared: Arc<Shared>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    pub fn new(config: MonitorConfig, source: Arc<dyn MetricSource>) -> Self {
        let series = Arc::new(TimeSeries::new(config.retention));
        Self {
            config,
            source,
            names: Vec::new(),
            sampler: None,
            series,
            shared: Arc::new(Shared::default()),
            stop_tx: None,
            handle: None,
        }
    }

    /// Instantiates and sets up every configured collector.
    ///
    /// Setup is partial: each valid name is initialized and kept even when
    /// other names fail. Repeated names are set up once.
    ///
    /// # Errors
    ///
    /// Returns the first failure after all names were processed:
    /// [`Error::UnknownCollector`] for a name missing from the registry or
    /// [`Error::CollectorSetup`] if a collector could not take its baseline.
    /// Returns [`Error::InvalidState`] if called more than once.
    pub fn setup(&mut self) -> Result<()> {
        let state = self.state();
        if state != State::Idle {
            return Err(Error::InvalidState {
                operation: "set up",
                state,
            });
        }

        let mut collectors: Vec<Box<dyn Collector>> =
            Vec::with_capacity(self.config.collectors.len());
        let mut first_error = None;
        for name in &self.config.collectors {
            if collectors.iter().any(|c| c.name() == name.as_str()) {
                log::warn!(target: "monitor", "collector `{name}` configured twice, ignoring");
                continue;
            }
            match self.init_collector(name) {
                Ok(collector) => {
                    self.series.register(collector.name());
                    collectors.push(collector);
                }
                Err(err) => {
                    log::warn!(target: "monitor", "skipping collector: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }

        self.names = collectors.iter().map(|c| c.name()).collect();
        log::debug!(target: "monitor", "set up collectors {:?}", self.names);
        self.sampler = Some(Sampler {
            collectors,
            series: Arc::clone(&self.series),
            shared: Arc::clone(&self.shared),
        });
        self.shared.set_state(State::Ready);

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn init_collector(&self, name: &str) -> Result<Box<dyn Collector>> {
        let mut collector = registry::lookup(name)?(Arc::clone(&self.source));
        collector
            .setup()
            .map_err(|source| Error::CollectorSetup {
                name: collector.name(),
                source,
            })?;
        Ok(collector)
    }

    /// Runs a single tick on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the monitor is set up and not started.
    pub fn collect(&mut self) -> Result<()> {
        let state = self.state();
        match self.sampler.as_mut() {
            Some(sampler) if state == State::Ready => {
                sampler.tick(unix_timestamp());
                Ok(())
            }
            _ => Err(Error::InvalidState {
                operation: "collect with",
                state,
            }),
        }
    }

    /// Starts sampling on a background thread and returns immediately.
    ///
    /// If no collector could be set up the thread only sleeps between checks
    /// of the stop signal. A monitor can be started once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the monitor is [`State::Ready`], or
    /// [`Error::Spawn`] if the thread cannot be created.
    pub fn start(&mut self) -> Result<()> {
        let state = self.state();
        let sampler = match self.sampler.take() {
            Some(sampler) if state == State::Ready => sampler,
            other => {
                self.sampler = other;
                return Err(Error::InvalidState {
                    operation: "start",
                    state,
                });
            }
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let interval = self.config.interval;
        let shared = Arc::clone(&self.shared);
        shared.running.store(true, Ordering::Release);
        shared.set_state(State::Running);

        let spawned = thread::Builder::new()
            .name("hostmon-sampler".to_string())
            .spawn(move || {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| sampler.run(interval, stop_rx)));
                shared.running.store(false, Ordering::Release);
                match outcome {
                    Ok(()) => shared.set_state(State::Stopped),
                    Err(_) => {
                        log::error!(target: "monitor", "sampling thread panicked");
                        shared.set_state(State::Failed);
                    }
                }
            });

        match spawned {
            Ok(handle) => {
                log::debug!(
                    target: "monitor",
                    "started sampling every {:?}",
                    interval
                );
                self.handle = Some(handle);
                self.stop_tx = Some(stop_tx);
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                self.shared.set_state(State::Failed);
                Err(Error::Spawn(err))
            }
        }
    }

    /// Requests the sampling thread to stop without waiting for it.
    ///
    /// A no-op unless running.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::AcqRel) {
            self.shared.transition(State::Running, State::Stopping);
            if let Some(tx) = &self.stop_tx {
                // The thread may already be gone.
                let _ = tx.send(());
            }
        }
    }

    /// Blocks until the sampling thread has exited.
    ///
    /// Returns immediately if the monitor was never started. Without a prior
    /// [`stop`](Self::stop) this waits for as long as the monitor runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoopPanicked`] if the sampling thread panicked.
    pub fn join(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(Error::LoopPanicked);
            }
        }
        match self.state() {
            State::Failed => Err(Error::LoopPanicked),
            _ => Ok(()),
        }
    }

    pub fn state(&self) -> State {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Names of the collectors set up, in sampling order.
    pub fn collectors(&self) -> &[&'static str] {
        &self.names
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Shared handle to the collected data, readable while sampling runs.
    pub fn series(&self) -> Arc<TimeSeries> {
        Arc::clone(&self.series)
    }

    /// All samples of one collector, oldest first.
    pub fn samples(&self, name: &str) -> Vec<Entry> {
        self.series.samples(name)
    }

    pub fn latest(&self, name: &str) -> Option<Sample> {
        self.series.latest(name)
    }

    pub fn snapshot(&self) -> std::collections::BTreeMap<String, Vec<Entry>> {
        self.series.snapshot()
    }

    /// The most recent collector failure, if any.
    pub fn last_error(&self) -> Option<CollectionFailure> {
        self.shared.last_error()
    }

    pub fn failure_count(&self) -> u64 {
        self.shared.failures.load(Ordering::Relaxed)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("collectors", &self.names)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
