//! Session construction by mode

use super::agent::AgentBuilder;
use super::basic::{RoundDriver, SessionMode, SessionServices};
use super::error::{SessionError, SessionResult};
use super::experience::{Evaluator, ExperienceRecorder, JsonExperienceRecorder};
use super::follower::FollowerSession;
use super::interactive::Session;
use super::interactor::Interactor;
use crate::config::Configuration;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds sessions for a mode and shares its collaborators with each of them
pub struct SessionFactory {
    services: SessionServices,
}

impl SessionFactory {
    /// Create a factory around the host application's collaborators.
    ///
    /// When experience saving is enabled in `config`, sessions write records
    /// with a [`JsonExperienceRecorder`] under the configured directory unless
    /// another recorder is supplied.
    pub fn new(
        config: Configuration,
        interactor: Arc<dyn Interactor>,
        agents: Arc<dyn AgentBuilder>,
    ) -> Self {
        let experience: Option<Arc<dyn ExperienceRecorder>> = if config.experience.enabled {
            Some(Arc::new(JsonExperienceRecorder::new(
                config.experience.experience_dir.clone(),
            )))
        } else {
            None
        };

        Self {
            services: SessionServices {
                config: Arc::new(config),
                agents,
                interactor,
                evaluator: None,
                experience,
            },
        }
    }

    /// Evaluate sessions and, when `[session].eva_round` is set, rounds
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.services.evaluator = Some(evaluator);
        self
    }

    /// Replace the default experience recorder
    pub fn with_experience_recorder(mut self, recorder: Arc<dyn ExperienceRecorder>) -> Self {
        self.services.experience = Some(recorder);
        self
    }

    /// Configuration shared with every session
    pub fn config(&self) -> &Configuration {
        &self.services.config
    }

    /// Create the sessions for `mode`.
    ///
    /// * `"normal"`: one interactive session with id 0. An empty `request`
    ///   means the user is prompted for the first one.
    /// * `"follower"`: one replay session for a plan file, or one per plan file
    ///   when `plan` is a directory.
    ///
    /// Any other mode is a configuration error and nothing is created.
    pub fn create_session(
        &self,
        task: &str,
        mode: &str,
        plan: &Path,
        request: &str,
    ) -> SessionResult<Vec<Box<dyn RoundDriver>>> {
        let should_evaluate = self.config().session.eva_session;

        match mode.parse::<SessionMode>()? {
            SessionMode::Normal => {
                let session = Session::new(task, should_evaluate, 0, request, self.services.clone())?;
                Ok(vec![Box::new(session)])
            }
            SessionMode::Follower if plan.is_dir() => {
                self.create_follower_session_in_batch(task, plan)
            }
            SessionMode::Follower => {
                let session =
                    FollowerSession::new(task, plan, should_evaluate, 0, self.services.clone())?;
                Ok(vec![Box::new(session)])
            }
        }
    }

    /// One replay session per plan file in `plan_dir`.
    ///
    /// Files are taken in lexicographic order; the session at position `i` gets
    /// id `i` and task `"{task}/{file stem}"`. If any plan cannot be opened, no
    /// sessions are returned.
    pub fn create_follower_session_in_batch(
        &self,
        task: &str,
        plan_dir: &Path,
    ) -> SessionResult<Vec<Box<dyn RoundDriver>>> {
        let should_evaluate = self.config().session.eva_session;
        let plan_files = self.get_plan_files(plan_dir)?;
        tracing::info!(count = plan_files.len(), dir = %plan_dir.display(), "creating follower sessions");

        let mut sessions: Vec<Box<dyn RoundDriver>> = Vec::with_capacity(plan_files.len());
        for (id, plan_file) in plan_files.iter().enumerate() {
            let sub_task = format!("{}/{}", task, file_stem(plan_file));
            let session = FollowerSession::new(
                &sub_task,
                plan_file,
                should_evaluate,
                id,
                self.services.clone(),
            )?;
            sessions.push(Box::new(session));
        }
        Ok(sessions)
    }

    /// Plan files directly inside `plan_dir`, sorted by file name. Only
    /// regular entries whose name ends with the configured suffix count; names
    /// that are not valid UTF-8 are matched on their lossy form.
    pub fn get_plan_files(&self, plan_dir: &Path) -> SessionResult<Vec<PathBuf>> {
        let suffix = &self.config().session.plan_suffix;
        let entries =
            fs::read_dir(plan_dir).map_err(|e| SessionError::resource_access(plan_dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SessionError::resource_access(plan_dir, e))?;
            let path = entry.path();
            let file_name = entry.file_name();
            if file_name.to_str().is_none() {
                tracing::warn!(path = %path.display(), "plan file name is not valid UTF-8");
            }
            let matches = file_name.to_string_lossy().ends_with(suffix.as_str());
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
