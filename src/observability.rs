//! Logging setup driven by the gateway's `log.*` settings.
//!
//! Only the vendor client emits events; the adapter itself stays silent and leaves
//! error reporting to its host.

use crate::domain::config::{SETTING_LOG_FILE, Settings};
use crate::error::ConfigError;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when file logging is switched off.
const QUIET_LEVEL: &str = "warn";

/// The filter directive the settings ask for. `RUST_LOG` still wins when set.
pub fn log_filter(settings: &Settings) -> &'static str {
    if settings.log_enabled {
        settings.log_level.as_filter()
    } else {
        QUIET_LEVEL
    }
}

/// Installs a global subscriber.
///
/// With `log.LogEnabled` the output goes to `log.FileName` (created if needed);
/// otherwise warnings and errors go to stderr. Keep the returned guard alive for as
/// long as file logs should be flushed. A subscriber installed earlier by the host
/// is left in place, and then no guard is returned.
pub fn init_logging(settings: &Settings) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(settings)));
    let registry = tracing_subscriber::registry().with(filter);

    if !settings.log_enabled {
        registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .try_init()
            .ok();
        return Ok(None);
    }

    let file_name = settings
        .log_file
        .file_name()
        .ok_or_else(|| ConfigError::InvalidValue {
            key: SETTING_LOG_FILE,
            reason: "expected a file path".to_string(),
        })?;
    let directory = settings
        .log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(directory).map_err(|e| ConfigError::Io(Arc::new(e)))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    let installed = registry
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer),
        )
        .try_init();
    Ok(installed.ok().map(|()| guard))
}
