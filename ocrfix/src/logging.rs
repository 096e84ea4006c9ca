//! File logging for the TUI process.
//!
//! The terminal is owned by ratatui, so log output goes to `<dir>/ocrfix.log` through a
//! non-blocking appender. `RUST_LOG` overrides the default `info` filter.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines when dropped; keep it alive until exit.
///
/// # Errors
///
/// Returns `Err` if `dir` cannot be created.
pub fn init_logging(dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, "ocrfix.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
    Ok(guard)
}
