//! Logging infrastructure for docquery
//!
//! Logs go to [`Config::log_path`] (`~/.local/state/docquery/docquery.log`),
//! rotated daily. Nothing is written to stdout or stderr: the terminal UI
//! owns the screen and the CLI owns its output.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize the logging system
///
/// `RUST_LOG` wins over `logging.level`. The first event records which
/// backend and history file this process is using.
pub fn init(config: &Config) -> Result<LoggingGuard> {
    let (log_dir, prefix) = split_log_path(&Config::log_path())?;

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, &prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {}", e)))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        level = %config.logging.level,
        api = %config.api.base_url,
        history = %Config::history_path().display(),
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Directory and file-name prefix for the rolling appender
fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Config(format!("log path {:?} has no directory", path)))?;
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Config(format!("log path {:?} has no file name", path)))?;
    Ok((dir.to_path_buf(), prefix.to_string()))
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, prefix) = split_log_path(&Config::log_path()).unwrap();
        assert_eq!(dir, Config::state_dir());
        assert_eq!(prefix, "docquery.log");
    }

    #[test]
    fn test_split_log_path_rejects_bare_root() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
