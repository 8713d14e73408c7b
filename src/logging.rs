//! File-based logging.
//!
//! Command output goes to stdout, so diagnostics are written to a daily
//! rolling file instead.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "soundspace";
const DEFAULT_FILTER: &str = "soundspace=debug,rocket=warn,warn";

/// Initializes the global subscriber.
///
/// Logs land in `.logs/soundspace.YYYY-MM-DD`. `RUST_LOG` overrides the
/// default filter. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init_logging() -> std::io::Result<WorkerGuard> {
    let log_dir = Path::new(LOG_DIR);
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Logging initialized - logs written to {}/", LOG_DIR);
    Ok(guard)
}
