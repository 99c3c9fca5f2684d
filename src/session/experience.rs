//! Evaluation and experience hooks run when a session finishes

use super::error::{SessionError, SessionResult};
use super::round::RoundRecord;
use crate::records::save_to_json;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Scores a finished session or round. Scoring itself lives with the host
/// application; sessions only decide when to call it and where to keep the
/// result.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// # Arguments
    /// * `task` - Task name of the session.
    /// * `request` - What was asked: the conversation export for interactive
    ///   sessions, the plan's task for replays, or a single round's request.
    /// * `rounds` - Records of the rounds being judged.
    async fn evaluate(&self, task: &str, request: &Value, rounds: &[RoundRecord]) -> Result<Value>;
}

/// A finished run kept for later reference by agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceRecord {
    /// Task name
    pub task: String,
    /// Session mode name
    pub mode: String,
    /// Every round, ordered by id
    pub rounds: Vec<RoundRecord>,
    /// When the record was made
    pub saved_at: DateTime<Utc>,
}

impl ExperienceRecord {
    /// Record stamped with the current time
    pub fn new(task: &str, mode: &str, rounds: Vec<RoundRecord>) -> Self {
        Self {
            task: task.to_string(),
            mode: mode.to_string(),
            rounds,
            saved_at: Utc::now(),
        }
    }
}

/// Persists experience records
#[async_trait]
pub trait ExperienceRecorder: Send + Sync {
    /// Store `record`
    async fn save(&self, record: &ExperienceRecord) -> SessionResult<()>;
}

/// Writes each record to `<experience_dir>/<task>.json`
#[derive(Debug, Clone)]
pub struct JsonExperienceRecorder {
    experience_dir: PathBuf,
}

impl JsonExperienceRecorder {
    /// Recorder writing under `experience_dir`, created on first save
    pub fn new(experience_dir: impl Into<PathBuf>) -> Self {
        Self {
            experience_dir: experience_dir.into(),
        }
    }

    /// Directory records go to
    pub fn experience_dir(&self) -> &Path {
        &self.experience_dir
    }

    /// Target file for a task's record
    pub fn record_path(&self, task: &str) -> PathBuf {
        self.experience_dir.join(format!("{}.json", task))
    }
}

#[async_trait]
impl ExperienceRecorder for JsonExperienceRecorder {
    async fn save(&self, record: &ExperienceRecord) -> SessionResult<()> {
        if record.task.trim().is_empty() {
            return Err(SessionError::experience("cannot save experience for an unnamed task"));
        }
        save_to_json(record, &self.record_path(&record.task))?;
        Ok(())
    }
}
