//! File-based logging for jellyfin-rs
//!
//! The TUI owns the terminal, so tracing output goes to a rolling file instead of stdout.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "jellyfin-rs";
const DEFAULT_FILTER: &str = "jellyfin_rs=debug,reqwest=info,rodio=info,warn";

/// Initialize the logging system.
///
/// Logs are written to `.logs/jellyfin-rs.YYYY-MM-DD.log` with daily rotation.
/// `RUST_LOG` wins over `level_override`, which wins over the built-in defaults:
/// - `jellyfin_rs` modules: DEBUG
/// - `reqwest`, `rodio`: INFO
/// - Other crates: WARN
pub fn init_logging(level_override: Option<&str>) -> anyhow::Result<()> {
    let log_dir = Path::new(LOG_DIR);
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, LOG_FILE_PREFIX);

    // Non-blocking so a slow disk never stalls the render loop
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes on drop; it has to live as long as the process
    Box::leak(Box::new(guard));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = level_override
            .map(|level| format!("jellyfin_rs={},reqwest=info,warn", level))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        EnvFilter::new(directives)
    });

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("Logging initialized - logs written to {}/", LOG_DIR);

    Ok(())
}

/// Log a Jellyfin API request and its result
#[macro_export]
macro_rules! log_api_result {
    ($operation:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::info!(operation = $operation, "API request successful"),
            Err(e) => tracing::error!(operation = $operation, error = %e, "API request failed"),
        }
    };
}

/// Log a Jellyfin API request with additional context
#[macro_export]
macro_rules! log_api_request {
    ($operation:expr, $($field:tt)*) => {
        tracing::debug!(operation = $operation, $($field)*, "API request started");
    };
}
