//! Logging setup.
//!
//! `RUST_LOG` wins when set. Otherwise `-v` picks the level, and without
//! `-v` the configured filter applies. Logs go to stderr so stdout stays
//! clean for documents and reports.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process.
pub fn init(verbose: u8, configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, configured)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .init();

    tracing::debug!(verbose, "logging initialized");
}

fn filter_directive(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
