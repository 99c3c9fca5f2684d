//! Agent contract used by sessions
//!
//! Sessions never decide what an agent does. They only pick which agent a round
//! is bound to, tell it whether it is resuming, and reset its memory between
//! replayed steps. Everything else sits behind the [`Agent`] trait that the host
//! application implements.

use super::context::SharedContext;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to an agent. A session's host agent is also reachable from
/// the agent tree the host application keeps.
pub type AgentHandle = Arc<Mutex<dyn Agent>>;

/// Resumption marker set on an agent right before a round is bound to it.
///
/// Both tags mean "continue mid-task" rather than "start fresh"; agents skip
/// their first-time setup when they see one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    /// Continue the host agent
    ContinueHostAgent,
    /// Continue the active app agent
    ContinueAppAgent,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::ContinueHostAgent => write!(f, "continue_host_agent"),
            AgentState::ContinueAppAgent => write!(f, "continue_app_agent"),
        }
    }
}

/// Ordered record of requests an agent has handled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMemory {
    entries: Vec<Value>,
}

impl RequestMemory {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn add(&mut self, entry: impl Into<Value>) {
        self.entries.push(entry.into());
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the history as a JSON array, oldest first
    pub fn to_json(&self) -> Value {
        Value::Array(self.entries.clone())
    }
}

/// An agent's record of prior requests and interactions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blackboard {
    /// Requests handled so far
    pub requests: RequestMemory,
}

impl Blackboard {
    /// Empty blackboard
    pub fn new() -> Self {
        Self::default()
    }
}

/// Agent interface sessions drive.
///
/// `handle` runs one round's request to completion; it may take as long as the
/// underlying model or automation calls take.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name used in logs and round records
    fn name(&self) -> &str;

    /// Set the resumption tag for the next round
    fn set_state(&mut self, state: AgentState);

    /// Clear short-term memory
    fn clear_memory(&mut self);

    /// Request history and other shared memory
    fn blackboard(&self) -> &Blackboard;

    /// Mutable blackboard
    fn blackboard_mut(&mut self) -> &mut Blackboard;

    /// The application-scoped agent currently acting under this agent
    fn active_app_agent(&self) -> Option<AgentHandle>;

    /// Execute `request` to completion
    async fn handle(&mut self, request: &str, context: &SharedContext) -> Result<()>;
}

/// Builds a fresh host agent tree for each session
pub trait AgentBuilder: Send + Sync {
    /// A new host agent, sharing nothing with earlier ones
    fn build_host_agent(&self) -> AgentHandle;
}

impl<F> AgentBuilder for F
where
    F: Fn() -> AgentHandle + Send + Sync,
{
    fn build_host_agent(&self) -> AgentHandle {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_memory_export() {
        let mut memory = RequestMemory::new();
        assert!(memory.is_empty());
        assert_eq!(memory.to_json(), serde_json::json!([]));

        memory.add("open notepad");
        memory.add(serde_json::json!({"request": "type hello", "round": 1}));

        assert_eq!(memory.len(), 2);
        assert_eq!(
            memory.to_json(),
            serde_json::json!(["open notepad", {"request": "type hello", "round": 1}])
        );

        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_agent_state_display() {
        assert_eq!(AgentState::ContinueHostAgent.to_string(), "continue_host_agent");
        assert_eq!(AgentState::ContinueAppAgent.to_string(), "continue_app_agent");
    }
}
