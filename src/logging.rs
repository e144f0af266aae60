//! Log setup
//!
//! The terminal belongs to the UI, so events go to a file under the
//! platform data directory. `RUST_LOG` overrides the configured level.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{Result, StudyError, APP_NAME, LOG_FILE};

/// `<data dir>/studydesk/studydesk.log`
pub fn log_file_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        StudyError::ConfigError("Unable to determine data directory".to_string())
    })?;
    Ok(data_dir.join(APP_NAME).join(LOG_FILE))
}

/// Filter from `RUST_LOG`, else `default_level`
pub fn env_filter(default_level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level).map_err(|e| {
            StudyError::ConfigError(format!("Invalid log level '{}': {}", default_level, e))
        }),
    }
}

/// Install the global subscriber writing to the default log file
pub fn init(level: &str) -> Result<PathBuf> {
    let path = log_file_path()?;
    init_with_path(level, &path)?;
    Ok(path)
}

/// Install the global subscriber writing to `path`
pub fn init_with_path(level: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(env_filter(level)?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| StudyError::ConfigError(format!("Logging already initialized: {}", e)))
}
