//! Test utilities for ARCA
//!
//! Helpers shared by unit tests and the integration suite:
//! - [`init_test_logging`] wires `tracing` output into the test harness
//! - [`TestGit`] drives the system `git` to build fixture repositories
//! - [`SourceFixture`] lays out a source directory with a manifest and content
//!
//! Available under `cfg(test)` and the `test-utils` feature.

pub mod fixtures;
pub mod git_helper;

pub use fixtures::SourceFixture;
pub use git_helper::TestGit;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialises logging for tests once per process.
///
/// With `Some(level)` that level is used; otherwise `RUST_LOG` is honoured
/// and, when unset, nothing is logged.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
