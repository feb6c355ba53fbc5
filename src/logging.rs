//! Centralized logging setup
//!
//! The dashboard owns the terminal, so in TUI mode diagnostics go only to
//! a `debug.log` file next to the process. Headless mode additionally logs
//! to stderr. Both respect `RUST_LOG` and default to `info`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Initialize logging; returns the guard keeping the file writer alive
///
/// The caller must hold the guard for the process lifetime or buffered
/// log lines are lost on exit.
pub fn init_logging(headless: bool) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "debug.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(env_filter());

    if headless {
        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter()),
            )
            .init();
    } else {
        tracing_subscriber::registry().with(file_layer).init();
    }

    guard
}
