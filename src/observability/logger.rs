//! Markdown session logs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Logger for session and round events.
///
/// Writes a markdown transcript per session (session start, every round with
/// its request and bound agent, evaluation results, completion) and echoes a
/// one-line summary of each entry as a `tracing` event.
#[derive(Debug)]
pub struct Logger {
    log_file: PathBuf,
    log_level: String,
}

impl Logger {
    /// Initialize logger.
    ///
    /// # Arguments
    /// * `log_file` - Path to log file. If None, creates a timestamped file in temp directory.
    /// * `log_level` - Logging level (defaults to "INFO").
    pub fn new(log_file: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        let log_file = match log_file {
            Some(p) => p.to_path_buf(),
            None => std::env::temp_dir().join("sessionkit-logs").join(format!(
                "session_{}_{}.md",
                Utc::now().timestamp_millis(),
                std::process::id()
            )),
        };

        let log_level = log_level.unwrap_or("INFO").to_string();

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let logger = Self {
            log_file,
            log_level,
        };

        if !logger.log_file.exists() {
            logger.initialize_log_file()?;
        }

        Ok(logger)
    }

    /// Logger for one session, writing `<log_dir>/<task>/session.md`.
    pub fn for_session(log_dir: &Path, task: &str, log_level: Option<&str>) -> Result<Self> {
        Self::new(Some(&log_dir.join(task).join("session.md")), log_level)
    }

    fn initialize_log_file(&self) -> Result<()> {
        let mut file = File::create(&self.log_file)
            .with_context(|| format!("Failed to create log file: {}", self.log_file.display()))?;

        let now: DateTime<Utc> = Utc::now();

        writeln!(file, "# Session Log\n")?;
        writeln!(file, "Log started: {}\n", now.to_rfc3339())?;
        writeln!(file, "---\n")?;

        Ok(())
    }

    fn append_to_log(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.log_file.display()))?;

        write!(file, "{}", content).with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    /// Log session start.
    ///
    /// # Arguments
    /// * `task` - Task name of the session.
    /// * `mode` - Session mode (normal, follower).
    /// * `config` - Settings worth recording for the run.
    pub fn log_session_start(
        &self,
        task: &str,
        mode: &str,
        config: &HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "## Session Started - {}\n\n**Task:** {}\n**Mode:** {}\n**Config:** {}\n\n",
            now.to_rfc3339(),
            task,
            mode,
            serde_json::to_string_pretty(config).unwrap_or_default()
        );

        self.append_to_log(&content)?;
        tracing::info!(task, mode, "session started");
        Ok(())
    }

    /// Log the creation of a round.
    ///
    /// # Arguments
    /// * `round_id` - Id of the round within its session.
    /// * `request` - Request handed to the agent.
    /// * `agent` - Name of the agent the round is bound to.
    pub fn log_round_start(&self, round_id: usize, request: &str, agent: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Round {} - {}\n\n**Agent:** {}\n**Request:**\n```\n{}\n```\n\n",
            round_id,
            now.to_rfc3339(),
            agent,
            request
        );

        self.append_to_log(&content)?;
        tracing::info!(round_id, agent, "round started");
        Ok(())
    }

    /// Log the outcome of a round.
    pub fn log_round_result(&self, round_id: usize, status: &str) -> Result<()> {
        let content = format!("**Round {} status:** {}\n\n", round_id, status);

        self.append_to_log(&content)?;
        tracing::info!(round_id, status, "round finished");
        Ok(())
    }

    /// Log an evaluation result.
    ///
    /// # Arguments
    /// * `scope` - What was evaluated ("session" or "round N").
    /// * `result` - Evaluator output.
    pub fn log_evaluation(&self, scope: &str, result: &serde_json::Value) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Evaluation ({}) - {}\n\n```json\n{}\n```\n\n",
            scope,
            now.to_rfc3339(),
            serde_json::to_string_pretty(result).unwrap_or_default()
        );

        self.append_to_log(&content)?;
        tracing::info!(scope, "evaluation logged");
        Ok(())
    }

    /// Log error with context.
    ///
    /// # Arguments
    /// * `error` - Error message.
    /// * `context` - Additional context information.
    pub fn log_error(
        &self,
        error: &str,
        context: Option<&HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "### Error - {}\n\n**Error:** {}\n\n",
            now.to_rfc3339(),
            error
        );

        if let Some(ctx) = context {
            content.push_str(&format!(
                "**Context:** {}\n\n",
                serde_json::to_string_pretty(ctx).unwrap_or_default()
            ));
        }

        self.append_to_log(&content)?;
        tracing::error!("{}", error);
        Ok(())
    }

    /// Log session completion.
    ///
    /// # Arguments
    /// * `reason` - Reason for completion.
    /// * `total_rounds` - Rounds created over the session's lifetime.
    pub fn log_completion(&self, reason: &str, total_rounds: usize) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Session Completed - {}\n\n**Reason:** {}\n**Rounds:** {}\n\n---\n\n",
            now.to_rfc3339(),
            reason,
            total_rounds
        );

        self.append_to_log(&content)?;
        tracing::info!(total_rounds, "session completed: {}", reason);
        Ok(())
    }

    /// Log custom content.
    ///
    /// # Arguments
    /// * `title` - Log entry title.
    /// * `content` - Log content.
    /// * `level` - Log level.
    pub fn log_custom(&self, title: &str, content: &str, level: Option<&str>) -> Result<()> {
        let level = level.unwrap_or("INFO");
        let now: DateTime<Utc> = Utc::now();
        let log_content = format!("### {} - {}\n\n{}\n\n", title, now.to_rfc3339(), content);

        self.append_to_log(&log_content)?;

        match level {
            "ERROR" => tracing::error!("{}: {}", title, content),
            "WARN" => tracing::warn!("{}: {}", title, content),
            _ => tracing::info!("{}: {}", title, content),
        }

        Ok(())
    }

    /// Get the log file path.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Get the log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}
