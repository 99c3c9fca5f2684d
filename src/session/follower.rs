//! Replay sessions that follow a recorded plan

use super::agent::AgentState;
use super::basic::{RoundDriver, SessionCore, SessionMode, SessionServices};
use super::error::{SessionError, SessionResult};
use super::interactor::print_with_color;
use super::plan_reader::PlanReader;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// A session that replays a plan file without asking the user anything.
///
/// Round 0 asks the host agent to bring up the plan's application; each later
/// round hands the next recorded step to the host's active app agent.
pub struct FollowerSession {
    core: SessionCore,
    plan_reader: PlanReader,
}

impl FollowerSession {
    /// Open `plan_file` and prepare a replay. A missing or unreadable plan is
    /// reported here, before any round exists.
    pub fn new(
        task: &str,
        plan_file: &Path,
        should_evaluate: bool,
        id: usize,
        services: SessionServices,
    ) -> SessionResult<Self> {
        let plan_reader = PlanReader::from_file(plan_file)?;
        Self::with_reader(task, plan_reader, should_evaluate, id, services)
    }

    /// Replay an already loaded plan
    pub fn with_reader(
        task: &str,
        plan_reader: PlanReader,
        should_evaluate: bool,
        id: usize,
        services: SessionServices,
    ) -> SessionResult<Self> {
        let mut core = SessionCore::new(task, SessionMode::Follower, id, services)?;
        core.set_should_evaluate(should_evaluate);
        Ok(Self { core, plan_reader })
    }

    /// Plan being replayed
    pub fn plan_reader(&self) -> &PlanReader {
        &self.plan_reader
    }
}

#[async_trait]
impl RoundDriver for FollowerSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    async fn next_request(&mut self) -> SessionResult<String> {
        if self.plan_reader.task_finished() {
            self.core.book_mut().mark_finished();
            return Ok(String::new());
        }

        if self.core.total_rounds() == 0 {
            Ok(self.plan_reader.get_host_agent_request())
        } else {
            Ok(self.plan_reader.next_step().unwrap_or_default())
        }
    }

    async fn create_new_round(&mut self) -> SessionResult<Option<usize>> {
        if self.core.is_finished() {
            return Ok(None);
        }
        let request = self.next_request().await?;
        if self.core.book().is_finished() {
            return Ok(None);
        }

        let agent = if self.core.total_rounds() == 0 {
            print_with_color("Complete the following request:", "yellow");
            let initial_request = self.plan_reader.get_initial_request();
            print_with_color(&initial_request, "cyan");
            let plan_file = self
                .plan_reader
                .plan_file()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.core.with_logger(|l| {
                l.log_custom(
                    "Replay",
                    &format!("**Plan:** {}\n**Request:** {}", plan_file, initial_request),
                    None,
                )
            });
            self.core.host_agent().clone()
        } else {
            let app_agent = self.core.host_agent().lock().await.active_app_agent();
            let app_agent = app_agent.ok_or(SessionError::NoActiveAppAgent {
                round_id: self.core.book().next_id(),
            })?;
            {
                let mut guard = app_agent.lock().await;
                guard.clear_memory();
                guard.blackboard_mut().requests.clear();
                guard.set_state(AgentState::ContinueAppAgent);
            }
            app_agent
        };

        let id = self.core.register_round(request, agent).await?;
        Ok(Some(id))
    }

    async fn request_to_evaluate(&self) -> SessionResult<Value> {
        Ok(Value::String(self.plan_reader.get_task().to_string()))
    }
}
