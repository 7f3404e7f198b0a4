use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use super::config::Settings;

/// Installs a file-backed `tracing` subscriber.
///
/// The terminal UI owns stdout, so log lines go to `wsgrid.log` in the
/// configured log directory. `RUST_LOG` overrides the configured filter.
/// Returns the writer guard, which must stay alive for logs to flush, or
/// `None` when no log directory is available or a subscriber already exists.
pub fn init_logging(settings: &Settings) -> Option<WorkerGuard> {
    let log_dir = settings.resolved_log_dir()?;
    fs::create_dir_all(&log_dir).ok()?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "wsgrid.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    tracing::info!(log_dir = %log_dir.display(), "logging initialized");
    Some(guard)
}
