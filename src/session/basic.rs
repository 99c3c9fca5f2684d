//! Shared round bookkeeping and the round-driving loop
//!
//! Both session variants compose a [`SessionCore`] and implement
//! [`RoundDriver`]; the loop in [`RoundDriver::run`] is the same for both:
//!
//! ```text
//! NotStarted -> RoundActive <-> AwaitingNext -> Finished
//! ```
//!
//! Termination is cooperative. A round in flight always runs to completion and
//! the finish flag is only looked at between rounds.

use super::agent::{AgentBuilder, AgentHandle};
use super::context::{Context, ContextName, SharedContext};
use super::error::{SessionError, SessionResult};
use super::experience::{Evaluator, ExperienceRecorder};
use super::interactor::Interactor;
use super::round::{Round, RoundRecord};
use crate::config::Configuration;
use crate::observability::Logger;
use crate::records::save_to_json;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a session obtains its requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Requests come from the user through an [`Interactor`]
    Normal,
    /// Requests are replayed from a recorded plan
    Follower,
}

impl SessionMode {
    /// Lowercase name used in config files and logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionMode::Normal => "normal",
            SessionMode::Follower => "follower",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SessionMode {
    type Err = SessionError;

    fn from_str(s: &str) -> SessionResult<Self> {
        match s {
            "normal" => Ok(SessionMode::Normal),
            "follower" => Ok(SessionMode::Follower),
            _ => Err(SessionError::configuration(format!(
                "The {} mode is not supported.",
                s
            ))),
        }
    }
}

/// Where a session is in its round loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No round created yet
    NotStarted,
    /// A round is registered and may be running
    RoundActive,
    /// The last round is done; deciding whether to start another
    AwaitingNext,
    /// Terminal: no further rounds are created
    Finished,
}

/// Round registry plus the finish flag.
///
/// Ids are handed out as 0, 1, 2, ... in creation order and never reused,
/// whatever happens to the round afterwards.
#[derive(Debug, Default)]
pub struct RoundBook {
    rounds: BTreeMap<usize, Round>,
    finish: bool,
    limit: Option<usize>,
}

impl RoundBook {
    /// Empty book; `limit` caps the number of rounds when set
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            rounds: BTreeMap::new(),
            finish: false,
            limit,
        }
    }

    /// Rounds registered so far
    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Id the next round must carry
    pub fn next_id(&self) -> usize {
        self.total_rounds()
    }

    /// Set the finish flag. It never goes back to false.
    pub fn mark_finished(&mut self) {
        self.finish = true;
    }

    /// The finish flag alone, ignoring the round limit
    pub fn finish(&self) -> bool {
        self.finish
    }

    /// True when a round limit exists and has been reached
    pub fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.total_rounds() >= limit)
    }

    /// Finished by the flag or by the round limit
    pub fn is_finished(&self) -> bool {
        self.finish || self.limit_reached()
    }

    /// Add a round under its id, which must equal [`RoundBook::next_id`]
    pub fn register(&mut self, round: Round) -> SessionResult<usize> {
        let expected = self.next_id();
        if round.id() != expected {
            return Err(SessionError::InvalidRoundId {
                expected,
                found: round.id(),
            });
        }
        self.rounds.insert(expected, round);
        Ok(expected)
    }

    /// Round by id
    pub fn get(&self, id: usize) -> Option<&Round> {
        self.rounds.get(&id)
    }

    /// Mutable round by id
    pub fn get_mut(&mut self, id: usize) -> Option<&mut Round> {
        self.rounds.get_mut(&id)
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<usize> {
        self.rounds.keys().copied().collect()
    }

    /// Snapshot of every round, ordered by id
    pub fn records(&self) -> Vec<RoundRecord> {
        self.rounds.values().map(Round::record).collect()
    }

    /// Ids of rounds whose agent returned an error
    pub fn failed_rounds(&self) -> Vec<usize> {
        self.rounds
            .values()
            .filter(|r| r.status().is_failed())
            .map(Round::id)
            .collect()
    }
}

/// Collaborators shared by every session a factory creates
#[derive(Clone)]
pub struct SessionServices {
    /// Settings every session reads
    pub config: Arc<Configuration>,
    /// Builds one host agent per session
    pub agents: Arc<dyn AgentBuilder>,
    /// Source of user requests and answers
    pub interactor: Arc<dyn Interactor>,
    /// Judges sessions and rounds; nothing is evaluated without one
    pub evaluator: Option<Arc<dyn Evaluator>>,
    /// Where finished interactive runs are saved
    pub experience: Option<Arc<dyn ExperienceRecorder>>,
}

/// Result of a finished session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Session id
    pub id: usize,
    /// Task name
    pub task: String,
    /// Mode the session ran in
    pub mode: SessionMode,
    /// Rounds created
    pub total_rounds: usize,
    /// Ids of rounds whose agent failed
    pub failed_rounds: Vec<usize>,
    /// Session evaluation, when an evaluator ran
    pub evaluation: Option<Value>,
    /// Whether the run was saved as experience
    pub experience_saved: bool,
}

/// State common to both session variants
pub struct SessionCore {
    id: usize,
    task: String,
    mode: SessionMode,
    should_evaluate: bool,
    book: RoundBook,
    context: SharedContext,
    host_agent: AgentHandle,
    services: SessionServices,
    logger: Option<Logger>,
    log_path: Option<PathBuf>,
    state: DriverState,
}

impl SessionCore {
    /// Build the session's context, host agent and (when a log dir is
    /// configured) its markdown logger.
    pub fn new(
        task: &str,
        mode: SessionMode,
        id: usize,
        services: SessionServices,
    ) -> SessionResult<Self> {
        let config = services.config.clone();
        let log_path = config
            .logging
            .log_dir
            .as_ref()
            .map(|dir| Path::new(dir).join(task));

        let logger = match &config.logging.log_dir {
            Some(dir) => Some(
                Logger::for_session(Path::new(dir), task, Some(&config.logging.log_level))
                    .map_err(|e| logger_error(Path::new(dir).join(task), e))?,
            ),
            None => None,
        };

        let mut context = Context::new();
        context.set(ContextName::Id, id as u64);
        context.set(ContextName::Mode, mode.name());
        context.set(ContextName::Task, task);
        context.set(ContextName::TotalRounds, 0u64);
        if let Some(path) = &log_path {
            context.set(ContextName::LogPath, path.to_string_lossy().to_string());
        }

        Ok(Self {
            id,
            task: task.to_string(),
            mode,
            should_evaluate: config.session.eva_session,
            book: RoundBook::new(config.session.round_limit()),
            context: context.into_shared(),
            host_agent: services.agents.build_host_agent(),
            services,
            logger,
            log_path,
            state: DriverState::NotStarted,
        })
    }

    /// Session id
    pub fn id(&self) -> usize {
        self.id
    }

    /// Task name
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Session mode
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Whether the session is evaluated when it ends
    pub fn should_evaluate(&self) -> bool {
        self.should_evaluate
    }

    /// Override the configured `eva_session`
    pub fn set_should_evaluate(&mut self, should_evaluate: bool) {
        self.should_evaluate = should_evaluate;
    }

    /// Rounds and the finish flag
    pub fn book(&self) -> &RoundBook {
        &self.book
    }

    /// Mutable book, for marking the session finished
    pub fn book_mut(&mut self) -> &mut RoundBook {
        &mut self.book
    }

    /// Context shared with every round
    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// The session's host agent
    pub fn host_agent(&self) -> &AgentHandle {
        &self.host_agent
    }

    /// Collaborators this session was built with
    pub fn services(&self) -> &SessionServices {
        &self.services
    }

    /// Configuration this session reads
    pub fn config(&self) -> &Configuration {
        &self.services.config
    }

    /// Directory of the session log, when logging to files
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Current loop state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Rounds created so far
    pub fn total_rounds(&self) -> usize {
        self.book.total_rounds()
    }

    /// Terminal state reached, or the book says no more rounds
    pub fn is_finished(&self) -> bool {
        self.state == DriverState::Finished || self.book.is_finished()
    }

    /// Build a round with the next id, bound to `agent`, and register it.
    pub async fn register_round(&mut self, request: String, agent: AgentHandle) -> SessionResult<usize> {
        let id = self.book.next_id();
        let round = Round::new(
            request,
            agent,
            self.context.clone(),
            self.config().session.eva_round,
            id,
        )
        .await;

        self.with_logger(|l| l.log_round_start(id, round.request(), round.agent_name()));
        tracing::debug!(session = self.id, round_id = id, agent = round.agent_name(), "round created");

        let id = self.book.register(round)?;
        self.context
            .write()
            .await
            .set(ContextName::TotalRounds, self.book.total_rounds() as u64);
        self.state = DriverState::RoundActive;
        Ok(id)
    }

    /// Run a registered round. A failing round is logged and left marked as
    /// failed; the loop moves on to the next round.
    pub async fn run_round(&mut self, id: usize) -> SessionResult<()> {
        let round = self
            .book
            .get_mut(id)
            .ok_or(SessionError::InvalidRoundId {
                expected: id,
                found: id,
            })?;

        if let Err(e) = round.run().await {
            tracing::warn!(session = self.id, round_id = id, "{}", e);
            let mut ctx = HashMap::new();
            ctx.insert("round_id".to_string(), Value::from(id as u64));
            self.with_logger(|l| l.log_error(&e.to_string(), Some(&ctx)));
        }

        let (status, should_evaluate, record) = match self.book.get(id) {
            Some(round) => (round.status().to_string(), round.should_evaluate(), round.record()),
            None => return Ok(()),
        };
        self.with_logger(|l| l.log_round_result(id, &status));

        if should_evaluate {
            self.evaluate_round(record).await;
        }

        self.state = DriverState::AwaitingNext;
        Ok(())
    }

    async fn evaluate_round(&self, record: RoundRecord) {
        let Some(evaluator) = self.services.evaluator.clone() else {
            return;
        };
        let request = Value::String(record.request.clone());
        match evaluator.evaluate(&self.task, &request, &[record.clone()]).await {
            Ok(result) => {
                let scope = format!("round {}", record.id);
                self.with_logger(|l| l.log_evaluation(&scope, &result));
            }
            Err(e) => tracing::warn!(round_id = record.id, "round evaluation failed: {:#}", e),
        }
    }

    /// Evaluate the whole session against `request`, keeping the result next
    /// to the session log when there is one.
    pub async fn evaluate_session(&self, request: &Value) -> SessionResult<Option<Value>> {
        let Some(evaluator) = self.services.evaluator.clone() else {
            tracing::debug!(session = self.id, "no evaluator configured, skipping evaluation");
            return Ok(None);
        };

        let result = evaluator
            .evaluate(&self.task, request, &self.book.records())
            .await
            .map_err(|e| SessionError::evaluation(format!("{:#}", e)))?;

        self.with_logger(|l| l.log_evaluation("session", &result));
        if let Some(path) = &self.log_path {
            save_to_json(&result, &path.join("evaluation.json"))?;
        }
        Ok(Some(result))
    }

    /// Write the session header to the log
    pub fn log_session_start(&self) {
        let mut settings = HashMap::new();
        settings.insert("id".to_string(), Value::from(self.id as u64));
        settings.insert("eva_session".to_string(), Value::Bool(self.should_evaluate));
        settings.insert(
            "eva_round".to_string(),
            Value::Bool(self.config().session.eva_round),
        );
        self.with_logger(|l| l.log_session_start(&self.task, self.mode.name(), &settings));
    }

    /// Enter the terminal state
    pub fn mark_driver_finished(&mut self) {
        self.state = DriverState::Finished;
        let reason = if self.book.finish() {
            "no more requests"
        } else if self.book.limit_reached() {
            "round limit reached"
        } else {
            "stopped"
        };
        let total = self.book.total_rounds();
        self.with_logger(|l| l.log_completion(reason, total));
    }

    /// Summary without evaluation or experience results
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            task: self.task.clone(),
            mode: self.mode,
            total_rounds: self.book.total_rounds(),
            failed_rounds: self.book.failed_rounds(),
            evaluation: None,
            experience_saved: false,
        }
    }

    /// Write to the session log if there is one; a failed write is only a warning
    pub fn with_logger(&self, f: impl FnOnce(&Logger) -> anyhow::Result<()>) {
        if let Some(logger) = &self.logger {
            if let Err(e) = f(logger) {
                tracing::warn!("Failed to write session log: {:#}", e);
            }
        }
    }
}

/// Keep the I/O error behind a logger failure as the source
fn logger_error(path: PathBuf, error: anyhow::Error) -> SessionError {
    match error.downcast::<std::io::Error>() {
        Ok(io_error) => SessionError::resource_access(path, io_error),
        Err(other) => SessionError::resource_access(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", other)),
        ),
    }
}

/// Interface both session variants implement.
///
/// Implementors decide the next request and which agent a round is bound to;
/// the loop, evaluation and bookkeeping are shared.
#[async_trait]
pub trait RoundDriver: Send + Sync {
    /// Shared state and bookkeeping
    fn core(&self) -> &SessionCore;

    /// Mutable access to the shared state
    fn core_mut(&mut self) -> &mut SessionCore;

    /// Request for the round about to be created. May set the finish flag.
    async fn next_request(&mut self) -> SessionResult<String>;

    /// Create and register the next round, or return `None` once finished
    async fn create_new_round(&mut self) -> SessionResult<Option<usize>>;

    /// What an evaluator should judge this session against
    async fn request_to_evaluate(&self) -> SessionResult<Value>;

    /// Hook run after the last round and the evaluation
    async fn finalize(&mut self, _summary: &mut SessionSummary) -> SessionResult<()> {
        Ok(())
    }

    /// Session id
    fn id(&self) -> usize {
        self.core().id()
    }

    /// Task name
    fn task(&self) -> &str {
        self.core().task()
    }

    /// Session mode
    fn mode(&self) -> SessionMode {
        self.core().mode()
    }

    /// Rounds created so far
    fn total_rounds(&self) -> usize {
        self.core().total_rounds()
    }

    /// No more rounds will be created
    fn is_finished(&self) -> bool {
        self.core().is_finished()
    }

    /// Current loop state
    fn state(&self) -> DriverState {
        self.core().state()
    }

    /// Round by id
    fn round(&self, id: usize) -> Option<&Round> {
        self.core().book().get(id)
    }

    /// Drive rounds until the session finishes, then evaluate and finalize.
    async fn run(&mut self) -> SessionResult<SessionSummary> {
        self.core().log_session_start();

        while !self.is_finished() {
            let Some(round_id) = self.create_new_round().await? else {
                break;
            };
            self.core_mut().run_round(round_id).await?;
        }
        self.core_mut().mark_driver_finished();

        let mut summary = self.core().summary();
        if self.core().should_evaluate() {
            let request = self.request_to_evaluate().await?;
            summary.evaluation = self.core().evaluate_session(&request).await?;
        }

        self.finalize(&mut summary).await?;
        Ok(summary)
    }
}
