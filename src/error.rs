use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures that can stop the app before or while the terminal is up.
///
/// The starfield and the navigation controller never produce these; they
/// degrade by skipping a frame or dropping an event.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}
