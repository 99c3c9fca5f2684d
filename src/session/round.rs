//! One request executed against one agent

use super::agent::AgentHandle;
use super::context::{ContextName, SharedContext};
use super::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};

/// Outcome of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum RoundStatus {
    /// Created, not yet run
    Pending,
    /// The agent handled the request
    Completed,
    /// The agent reported an error; the message is kept verbatim
    Failed(String),
}

impl RoundStatus {
    /// True for [`RoundStatus::Failed`]
    pub fn is_failed(&self) -> bool {
        matches!(self, RoundStatus::Failed(_))
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStatus::Pending => write!(f, "pending"),
            RoundStatus::Completed => write!(f, "completed"),
            RoundStatus::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Serializable snapshot of a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round id
    pub id: usize,
    /// Request the round executed
    pub request: String,
    /// Name of the agent bound to the round
    pub agent: String,
    /// Outcome so far
    #[serde(flatten)]
    pub status: RoundStatus,
}

/// A single request bound to the agent that will execute it.
///
/// Everything except the status is fixed at construction.
pub struct Round {
    id: usize,
    request: String,
    agent: AgentHandle,
    agent_name: String,
    context: SharedContext,
    should_evaluate: bool,
    status: RoundStatus,
}

impl Round {
    /// Bind `request` to `agent`. The agent's name is read once, here.
    pub async fn new(
        request: String,
        agent: AgentHandle,
        context: SharedContext,
        should_evaluate: bool,
        id: usize,
    ) -> Self {
        let agent_name = agent.lock().await.name().to_string();
        Self {
            id,
            request,
            agent,
            agent_name,
            context,
            should_evaluate,
            status: RoundStatus::Pending,
        }
    }

    /// Round id
    pub fn id(&self) -> usize {
        self.id
    }

    /// Request text
    pub fn request(&self) -> &str {
        &self.request
    }

    /// Agent that executes the round
    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    /// Agent name captured at construction
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Whether the round is evaluated after it runs
    pub fn should_evaluate(&self) -> bool {
        self.should_evaluate
    }

    /// Current outcome
    pub fn status(&self) -> &RoundStatus {
        &self.status
    }

    /// Snapshot for logs and evaluators
    pub fn record(&self) -> RoundRecord {
        RoundRecord {
            id: self.id,
            request: self.request.clone(),
            agent: self.agent_name.clone(),
            status: self.status.clone(),
        }
    }

    /// Run the request on the bound agent until it returns.
    ///
    /// A failure is recorded on the round and returned as
    /// [`SessionError::RoundExecution`]; the round keeps its id either way.
    pub async fn run(&mut self) -> SessionResult<()> {
        {
            let mut context = self.context.write().await;
            context.set(ContextName::CurrentRoundId, self.id as u64);
            context.set(ContextName::Request, self.request.clone());
        }

        let result = {
            let mut agent = self.agent.lock().await;
            agent.handle(&self.request, &self.context).await
        };

        match result {
            Ok(()) => {
                self.status = RoundStatus::Completed;
                Ok(())
            }
            Err(e) => {
                let message = format!("{:#}", e);
                self.status = RoundStatus::Failed(message.clone());
                Err(SessionError::round_execution(self.id, message))
            }
        }
    }
}

impl std::fmt::Debug for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Round")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("agent", &self.agent_name)
            .field("should_evaluate", &self.should_evaluate)
            .field("status", &self.status)
            .finish()
    }
}
