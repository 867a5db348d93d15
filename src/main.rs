/// Entry point for the hostmon host metrics sampler.
///
/// Samples host CPU, load, memory and network statistics on a fixed interval
/// and prints the collected time series as JSON on exit.
///
/// # Examples
///
/// ```bash
/// HOSTMON_INTERVAL=1 HOSTMON_DURATION=10 RUST_LOG=debug cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    hostmon::run().await
}
