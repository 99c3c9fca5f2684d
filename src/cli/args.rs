//! Command-line arguments for launching sessions

use clap::Parser;
use std::path::PathBuf;

use crate::cli::error::{CliError, CliResult};
use crate::config::{Configuration, ConfigurationLoader};

/// Arguments accepted by [`crate::cli::execute`].
///
/// Host binaries usually flatten this into their own parser.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(about = "Run a task session, live or replayed from a plan")]
pub struct SessionArgs {
    /// Task name, also used to name log and experience files
    #[arg(short, long)]
    pub task: String,

    /// Session mode: "normal" or "follower". Falls back to SESSIONKIT_MODE,
    /// then to the configured default.
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Plan file, or a directory of plan files, for follower mode
    #[arg(short, long)]
    pub plan: Option<PathBuf>,

    /// First request for a normal session; prompted for when empty
    #[arg(short, long, default_value = "")]
    pub request: String,

    /// Path to the TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run batch sessions concurrently instead of one after another
    #[arg(long)]
    pub concurrent: bool,
}

impl SessionArgs {
    /// Configuration named by `--config`, or the default location.
    ///
    /// A file passed explicitly must exist; without `--config` a missing
    /// default file means built-in defaults.
    pub fn load_configuration(&self) -> CliResult<Configuration> {
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(CliError::ConfigError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(ConfigurationLoader::new(self.config.as_deref())?.config)
    }

    /// Check argument combinations clap cannot express
    pub fn validate(&self, mode: &str) -> Result<(), String> {
        if self.task.trim().is_empty() {
            return Err("task name must not be empty".to_string());
        }
        if mode == "follower" && self.plan.is_none() {
            return Err("follower mode needs --plan".to_string());
        }
        Ok(())
    }
}
