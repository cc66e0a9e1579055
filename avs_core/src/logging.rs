//! Logging infrastructure for avsx.
//!
//! All diagnostics go to stderr through `tracing`; stdout stays
//! reserved for result rows, JSON output, and report paths.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with the default filter
///
/// Pipeline milestones log at info, intermediate values at debug.
/// `RUST_LOG` overrides the default.
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific default level
///
/// The filter still yields to `RUST_LOG` when it is set. Output is
/// compact and written to stderr so machine-readable stdout never
/// interleaves with diagnostics.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
