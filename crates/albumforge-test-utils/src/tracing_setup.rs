//! Tracing initialisation for tests.

use tracing_subscriber::EnvFilter;

/// Install a subscriber that routes events through the test-harness writer,
/// filtered by `RUST_LOG` (falling back to `info`).
///
/// Idempotent: the first caller in the process wins, later calls are no-ops,
/// so every test can call this unconditionally.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
