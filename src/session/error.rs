//! Error types for session construction and round driving

use crate::records::RecordError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while building or driving sessions
#[derive(Error, Debug)]
pub enum SessionError {
    /// Invalid settings or an unsupported mode
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong
        message: String,
    },

    /// A file or directory could not be read or created
    #[error("Cannot access {path}: {source}")]
    ResourceAccess {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A plan file is not valid plan JSON
    #[error("Invalid plan file {path}: {source}")]
    PlanFormat {
        /// Plan file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Saving a session record failed
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// An agent failed while handling a round
    #[error("Round {round_id} failed: {message}")]
    RoundExecution {
        /// Failed round
        round_id: usize,
        /// Agent error, with its context chain
        message: String,
    },

    /// A follower round found no app agent on the host
    #[error("No active app agent to bind round {round_id} to")]
    NoActiveAppAgent {
        /// Round that could not be created
        round_id: usize,
    },

    /// A round was registered out of order
    #[error("Round id out of sequence: expected {expected}, found {found}")]
    InvalidRoundId {
        /// Next id the book expects
        expected: usize,
        /// Id the round carried
        found: usize,
    },

    /// The evaluator failed
    #[error("Evaluation error: {message}")]
    Evaluation {
        /// Evaluator error
        message: String,
    },

    /// Saving experience failed
    #[error("Experience error: {message}")]
    Experience {
        /// Recorder error
        message: String,
    },
}

impl SessionError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a resource access error for `path`
    pub fn resource_access<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::ResourceAccess {
            path: path.into(),
            source,
        }
    }

    /// Create a round execution error
    pub fn round_execution<S: Into<String>>(round_id: usize, message: S) -> Self {
        Self::RoundExecution {
            round_id,
            message: message.into(),
        }
    }

    /// Create an evaluation error
    pub fn evaluation<S: Into<String>>(message: S) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create an experience error
    pub fn experience<S: Into<String>>(message: S) -> Self {
        Self::Experience {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (user can potentially fix it)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::Configuration { .. }
                | SessionError::ResourceAccess { .. }
                | SessionError::PlanFormat { .. }
        )
    }

    /// Get a user-friendly error message with recovery suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            SessionError::Configuration { message } => {
                format!(
                    "{}. Supported modes are 'normal' and 'follower'.",
                    message
                )
            }
            SessionError::ResourceAccess { path, source } => {
                format!(
                    "Cannot access {} ({}). Check that the plan path exists and is readable.",
                    path.display(),
                    source
                )
            }
            SessionError::PlanFormat { path, source } => {
                format!(
                    "Plan file {} is not valid JSON ({}). Re-record or fix the plan.",
                    path.display(),
                    source
                )
            }
            _ => self.to_string(),
        }
    }
}
