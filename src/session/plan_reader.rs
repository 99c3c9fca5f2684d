//! Recorded plans for replay sessions
//!
//! A plan is a JSON document:
//!
//! ```json
//! {
//!     "task": "Sum column A",
//!     "object": "Excel",
//!     "steps": ["Select column A", "Click AutoSum"],
//!     "close": false
//! }
//! ```

use super::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Plan file content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Task the plan accomplishes
    #[serde(default)]
    pub task: String,
    /// Application the plan operates on
    #[serde(default)]
    pub object: String,
    /// Requests for the app agent, in order
    #[serde(default)]
    pub steps: Vec<String>,
    /// Whether the application should be closed after replay
    #[serde(default)]
    pub close: bool,
}

/// Serves a plan's requests in order. The step cursor only moves forward.
#[derive(Debug, Clone)]
pub struct PlanReader {
    plan_file: Option<PathBuf>,
    plan: Plan,
    remaining_steps: VecDeque<String>,
}

impl PlanReader {
    /// Read and parse `plan_file`.
    ///
    /// Filesystem failures surface as [`SessionError::ResourceAccess`] with the
    /// original I/O error attached.
    pub fn from_file(plan_file: &Path) -> SessionResult<Self> {
        let content = fs::read_to_string(plan_file)
            .map_err(|e| SessionError::resource_access(plan_file, e))?;
        let plan: Plan = serde_json::from_str(&content).map_err(|e| SessionError::PlanFormat {
            path: plan_file.to_path_buf(),
            source: e,
        })?;

        let mut reader = Self::from_plan(plan);
        reader.plan_file = Some(plan_file.to_path_buf());
        Ok(reader)
    }

    /// Reader over an in-memory plan
    pub fn from_plan(plan: Plan) -> Self {
        let remaining_steps = plan.steps.iter().cloned().collect();
        Self {
            plan_file: None,
            plan,
            remaining_steps,
        }
    }

    /// File the plan came from, if any
    pub fn plan_file(&self) -> Option<&Path> {
        self.plan_file.as_deref()
    }

    /// Plan task
    pub fn get_task(&self) -> &str {
        &self.plan.task
    }

    /// Application the plan targets
    pub fn get_operation_object(&self) -> &str {
        &self.plan.object
    }

    /// All steps, served or not
    pub fn get_steps(&self) -> &[String] {
        &self.plan.steps
    }

    /// Whether to close the application afterwards
    pub fn get_close(&self) -> bool {
        self.plan.close
    }

    /// Task description shown to the user when replay starts
    pub fn get_initial_request(&self) -> String {
        format!("{} in {}", self.plan.task, self.plan.object)
    }

    /// Request for round 0: bring the target application up
    pub fn get_host_agent_request(&self) -> String {
        format!(
            "Open and select the application of {}, and output the FINISH status immediately. \
             You must output the selected application with their control text and label even if it is already open.",
            self.plan.object
        )
    }

    /// Pop the next recorded step
    pub fn next_step(&mut self) -> Option<String> {
        self.remaining_steps.pop_front()
    }

    /// Steps not yet served
    pub fn remaining(&self) -> usize {
        self.remaining_steps.len()
    }

    /// True once every step has been served
    pub fn task_finished(&self) -> bool {
        self.remaining_steps.is_empty()
    }
}
