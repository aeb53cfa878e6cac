// FormRelay - Structured logging via tracing
//
// Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "FORMRELAY_LOG";

/// Initialize the global tracing subscriber.
///
/// `FORMRELAY_LOG` wins when set, otherwise `default_directive` applies.
/// Examples:
///   FORMRELAY_LOG=debug
///   FORMRELAY_LOG=formrelay::upstream=trace,info
pub fn init(default_directive: &str) {
    fmt()
        .with_env_filter(filter(default_directive))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initialize logger for tests (does not panic if called multiple times).
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(filter("debug"))
        .with_test_writer()
        .try_init();
}
