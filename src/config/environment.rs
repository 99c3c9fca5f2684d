//! Environment variable loading and management.
//!
//! Only host-level overrides live here; everything else comes from the TOML
//! configuration.

use std::env;
use std::path::Path;

/// Environment variable selecting the default session mode
pub const SESSION_MODE_VAR: &str = "SESSIONKIT_MODE";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Nothing is loaded when None.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    eprintln!("Warning: Failed to load .env file: {}", e);
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// Session mode override ("normal" or "follower"), if set.
    pub fn session_mode(&self) -> Option<String> {
        env::var(SESSION_MODE_VAR).ok().filter(|m| !m.trim().is_empty())
    }

    /// Log level taken from RUST_LOG, if set.
    pub fn log_level(&self) -> Option<String> {
        env::var("RUST_LOG").ok()
    }

    /// The .env file this loader was created with
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
