//! Interactive sessions driven by user requests

use super::agent::AgentState;
use super::basic::{RoundDriver, SessionCore, SessionMode, SessionServices, SessionSummary};
use super::error::SessionResult;
use super::experience::ExperienceRecord;
use async_trait::async_trait;
use serde_json::Value;

/// A session whose requests come from the user, one per round.
///
/// The first request may be supplied up front; otherwise the user is prompted.
/// Every later round asks whether there is more to do, and the session ends on
/// the user's "no".
pub struct Session {
    core: SessionCore,
    init_request: String,
}

impl Session {
    /// Create an interactive session. An empty `request` means the user is
    /// prompted for the first one.
    pub fn new(
        task: &str,
        should_evaluate: bool,
        id: usize,
        request: &str,
        services: SessionServices,
    ) -> SessionResult<Self> {
        let mut core = SessionCore::new(task, SessionMode::Normal, id, services)?;
        core.set_should_evaluate(should_evaluate);
        Ok(Self {
            core,
            init_request: request.to_string(),
        })
    }

    /// Request supplied at creation, possibly empty
    pub fn init_request(&self) -> &str {
        &self.init_request
    }
}

#[async_trait]
impl RoundDriver for Session {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    async fn next_request(&mut self) -> SessionResult<String> {
        let interactor = self.core.services().interactor.clone();

        if self.core.total_rounds() == 0 {
            if !self.init_request.is_empty() {
                return Ok(self.init_request.clone());
            }
            return Ok(interactor.first_request());
        }

        let (request, complete) = interactor.new_request();
        if complete {
            self.core.book_mut().mark_finished();
        }
        Ok(request)
    }

    async fn create_new_round(&mut self) -> SessionResult<Option<usize>> {
        if self.core.is_finished() {
            return Ok(None);
        }
        let request = self.next_request().await?;
        if self.core.book().is_finished() {
            return Ok(None);
        }

        let agent = self.core.host_agent().clone();
        agent.lock().await.set_state(AgentState::ContinueHostAgent);

        let id = self.core.register_round(request, agent).await?;
        Ok(Some(id))
    }

    async fn request_to_evaluate(&self) -> SessionResult<Value> {
        let host = self.core.host_agent().lock().await;
        Ok(host.blackboard().requests.to_json())
    }

    async fn finalize(&mut self, summary: &mut SessionSummary) -> SessionResult<()> {
        if !self.core.config().experience.enabled {
            return Ok(());
        }
        let Some(recorder) = self.core.services().experience.clone() else {
            return Ok(());
        };

        if self.core.services().interactor.experience_asker() {
            let record = ExperienceRecord::new(
                self.core.task(),
                SessionMode::Normal.name(),
                self.core.book().records(),
            );
            recorder.save(&record).await?;
            summary.experience_saved = true;
            tracing::info!(task = self.core.task(), "experience saved");
        }
        Ok(())
    }
}
