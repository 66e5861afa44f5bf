//! Error types for sw-core

use thiserror::Error;

/// Core error type for Stepwise
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Version string could not be parsed
    #[error("[E001] Invalid version '{value}': {reason}")]
    InvalidVersion { value: String, reason: String },

    /// E002: Settings are inconsistent with the migration catalog
    #[error("[E002] Improperly configured: {message}")]
    Configuration { message: String },

    /// E003: Configuration file not found
    #[error("[E003] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E004: Failed to parse configuration file
    #[error("[E004] Failed to parse config {path}: {source}")]
    ConfigParseError {
        path: String,
        source: serde_yaml::Error,
    },

    /// E005: Invalid value for a single setting
    #[error("[E005] Invalid setting '{field}': {message}")]
    InvalidSetting { field: &'static str, message: String },

    /// E006: IO error with file path context
    #[error("[E006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

impl CoreError {
    /// Shorthand for a [`CoreError::Configuration`] error
    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration {
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
