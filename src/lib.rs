//! Hostmon: a host metrics sampler.
//!
//! A [`Monitor`] periodically runs a configured set of named [`Collector`]s
//! (CPU time percentages, load averages, virtual memory, network I/O deltas)
//! on a background thread and keeps their timestamped samples in an in-memory
//! [`TimeSeries`]. Raw readings come from a [`MetricSource`]; [`ProcSource`]
//! reads them from procfs.

use std::sync::Arc;

use error::ResultOkLogExt;

pub mod collector;
pub mod config;
pub mod error;
pub mod monitor;
pub mod source;

pub use collector::{Collector, Sample};
pub use config::{AgentConfig, MonitorConfig};
pub use error::{Error, Result};
pub use monitor::{CollectionFailure, Entry, Monitor, State, TimeSeries};
pub use source::{MetricSource, ProcSource};

/// Runs the hostmon sampler.
///
/// Samples until Ctrl-C or until `HOSTMON_DURATION` elapses, then prints
/// everything collected as JSON to stdout.
///
/// # Errors
///
/// Possible errors include:
/// - Invalid configuration in the environment (see [`config`]).
/// - Failure to spawn the sampling thread.
/// - A panic on the sampling thread.
/// - Failure to serialize the collected samples.
pub async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig::from_env()?;
    log::debug!("Config: {config:?}");

    let duration = config.duration;
    let source = Arc::new(ProcSource::new(&config.rootfs));
    let mut monitor = Monitor::new(config.monitor, source);
    // Unknown or failing collectors are skipped; the rest still run.
    monitor.setup().ok_log();
    monitor.start()?;
    log::info!(
        "Sampling {:?} every {:?}",
        monitor.collectors(),
        monitor.interval()
    );

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            log::info!("Received Ctrl-C, stopping");
        }
        () = deadline => log::info!("Duration elapsed, stopping"),
    }

    monitor.stop();
    let monitor = tokio::task::spawn_blocking(move || {
        let joined = monitor.join();
        (monitor, joined)
    })
    .await?;
    let (monitor, joined) = monitor;
    joined?;

    if let Some(failure) = monitor.last_error() {
        log::warn!(
            "{} failed samples, last: collector={}, error={}",
            monitor.failure_count(),
            failure.collector,
            failure.error
        );
    }
    println!("{}", serde_json::to_string_pretty(&monitor.snapshot())?);
    Ok(())
}
