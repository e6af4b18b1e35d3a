use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while enumerating or reading log files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Log directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Whether this error ends a scan attempt, as opposed to skipping one file
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ScanError::FileRead { .. })
    }
}

/// Errors that can occur while generating a summary
#[derive(Error, Debug, Clone)]
pub enum SummaryError {
    #[error("Backend communication failed: {0}")]
    BackendError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl From<reqwest::Error> for SummaryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SummaryError::Timeout
        } else {
            SummaryError::HttpError(e.to_string())
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
