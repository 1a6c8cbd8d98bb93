//! Test support: a fake backend, session fixtures and log setup.

mod fake;
mod fixture;

pub use fake::{Action, FakeScheduleStore, RemoteCall};
pub use fixture::{RationedStore, TestSession, UnavailableStore, grid, test_scope, values};

/// Route `tracing` output to the test writer. `RUST_LOG` picks the level;
/// safe to call from every test.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
