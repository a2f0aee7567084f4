//! Tracing subscriber setup for the binary and for tests.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global fmt subscriber.
///
/// The filter comes from `RUST_LOG` (default `info`), e.g.
/// `RUST_LOG=ramp_sim=trace` to see placement give-ups.
///
/// ```no_run
/// ramp_sim::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Debug-level subscriber writing through the test harness; safe to call
/// from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
