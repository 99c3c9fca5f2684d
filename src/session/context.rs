//! Session-scoped key/value store

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Context handle shared between a session and its rounds
pub type SharedContext = Arc<RwLock<Context>>;

/// Keys a [`Context`] may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextName {
    /// Session id
    Id,
    /// Session mode, "normal" or "follower"
    Mode,
    /// Task name of the session
    Task,
    /// Id of the round currently running
    CurrentRoundId,
    /// Request of the round currently running
    Request,
    /// Number of rounds created so far
    TotalRounds,
    /// Directory the session logs into
    LogPath,
}

impl ContextName {
    /// Key as written in logs and exports
    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Mode => "MODE",
            Self::Task => "TASK",
            Self::CurrentRoundId => "CURRENT_ROUND_ID",
            Self::Request => "REQUEST",
            Self::TotalRounds => "TOTAL_ROUNDS",
            Self::LogPath => "LOG_PATH",
        }
    }
}

impl std::fmt::Display for ContextName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Cross-cutting session state visible to every round and agent of one session
#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: HashMap<ContextName, Value>,
}

impl Context {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a handle that rounds can share
    pub fn into_shared(self) -> SharedContext {
        Arc::new(RwLock::new(self))
    }

    /// Store `value` under `key`, replacing any earlier value
    pub fn set(&mut self, key: ContextName, value: impl Into<Value>) {
        self.entries.insert(key, value.into());
    }

    /// Raw value of `key`
    pub fn get(&self, key: ContextName) -> Option<&Value> {
        self.entries.get(&key)
    }

    /// String value of `key`, if present and a string
    pub fn get_str(&self, key: ContextName) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Unsigned value of `key`, if present and numeric
    pub fn get_u64(&self, key: ContextName) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// Whether `key` has been set
    pub fn contains(&self, key: ContextName) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of keys set
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no key is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export all entries as a JSON object keyed by [`ContextName::name`]
    pub fn to_json(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(k, v)| (k.name().to_string(), v.clone()))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}
