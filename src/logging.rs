//! File-backed tracing.
//!
//! The terminal belongs to the UI, so logs go to a daily rolling file
//! instead of stderr.

use crate::config::LoggingConfig;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive; drop it last.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    /// Directory the log files are written to.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

fn log_dir(config: &LoggingConfig) -> Option<PathBuf> {
    let preferred = config
        .directory
        .clone()
        .or_else(|| dirs::data_local_dir().map(|dir| dir.join("treeline").join("logs")));

    preferred
        .into_iter()
        .chain(std::iter::once(std::env::temp_dir().join("treeline").join("logs")))
        .find(|dir| std::fs::create_dir_all(dir).is_ok())
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `None`
/// when no log directory is writable or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Option<LoggingGuard> {
    let log_dir = log_dir(config)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "treeline.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("treeline={}", config.level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .ok()?;

    Some(LoggingGuard {
        _guard: guard,
        log_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_directory_is_created() {
        let root = tempfile::tempdir().unwrap();
        let wanted = root.path().join("nested").join("logs");
        let config = LoggingConfig {
            directory: Some(wanted.clone()),
            ..LoggingConfig::default()
        };
        assert_eq!(log_dir(&config), Some(wanted.clone()));
        assert!(wanted.is_dir());
    }
}
