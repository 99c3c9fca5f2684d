//! Error types for CLI operations

use crate::session::SessionError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur while running sessions from the command line
#[derive(Error, Debug)]
pub enum CliError {
    /// A session could not be created or failed while running
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid argument combination
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::ConfigError(format!("{:#}", err))
    }
}
