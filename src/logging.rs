use crate::config::{ensure_private_dir, get_logs_dir};
use crate::error::Result;
use std::path::Path;
use std::sync::{LazyLock, Mutex, Once};
use tracing_subscriber::{
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const LOG_FILE_NAME: &str = "client.log";

static LOGGER_INITIALIZED: Once = Once::new();

// Keep the guard alive for the lifetime of the program
static FILE_APPENDER_GUARD: LazyLock<Mutex<Option<tracing_appender::non_blocking::WorkerGuard>>> =
    LazyLock::new(|| Mutex::new(None));

/// Map the web UI's activity-log verbosity names onto tracing levels.
///
/// Unknown names fall back to `info`.
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "minimal" | "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Install console and file logging under `~/.hardlink-ui/logs`.
///
/// `RUST_LOG` takes precedence over `level`. Calling this more than once is a no-op.
pub fn init_logging(level: &str) -> Result<()> {
    let logs_dir = get_logs_dir()?;
    init_logging_in(&logs_dir, level)
}

pub fn init_logging_in(logs_dir: &Path, level: &str) -> Result<()> {
    ensure_private_dir(logs_dir)?;

    LOGGER_INITIALIZED.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

        let console_layer = fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter.clone());

        let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if let Ok(mut guard_mutex) = FILE_APPENDER_GUARD.lock() {
            *guard_mutex = Some(guard);
        }

        let file_layer = fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_filter(env_filter);

        // A subscriber installed elsewhere (tests, embedding app) wins
        let _ = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init();
    });

    Ok(())
}
