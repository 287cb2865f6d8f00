//! Domain error types

use std::path::PathBuf;

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("Invalid duration format: \"{0}\". Use e.g. 2.5s, 1600ms or 1m30s")]
    Malformed(String),

    #[error("Duration \"{0}\" must be greater than zero")]
    Zero(String),
}

/// Config file and value errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at {}", .0.display())]
    AlreadyExists(PathBuf),
}
