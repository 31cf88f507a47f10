//! Test log output.
//!
//! The library only emits `tracing` events; installing a subscriber is
//! left to the application. Tests call [`init_test`] to see them.
//! Honors `RUST_LOG`, defaulting to `debug` for this crate.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a test-writer subscriber once per process.
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("u_timetable=debug"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
