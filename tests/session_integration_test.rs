//! Integration tests for session construction and round driving
//!
//! Agents, interactors and evaluators are mocks that record what the sessions
//! asked of them.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use sessionkit::config::{Configuration, ConfigurationLoader};
use sessionkit::session::{
    Agent, AgentHandle, AgentState, Blackboard, ContextName, DriverState, Evaluator,
    RoundDriver, RoundRecord, RoundStatus, ScriptedInteractor, SessionError, SessionFactory,
    SessionMode, SharedContext, TerminalInteractor,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use tempfile::tempdir;
use tokio::sync::Mutex;

type CallLog = Arc<StdMutex<Vec<String>>>;

// Mock agent recording every request as "<name>:<request>"
struct MockAgent {
    name: String,
    blackboard: Blackboard,
    calls: CallLog,
    states: Arc<StdMutex<Vec<AgentState>>>,
    memory_clears: Arc<StdMutex<usize>>,
    app_agent: Option<AgentHandle>,
    fail_on: Option<String>,
}

impl MockAgent {
    fn new(name: &str, calls: CallLog) -> Self {
        Self {
            name: name.to_string(),
            blackboard: Blackboard::new(),
            calls,
            states: Arc::new(StdMutex::new(Vec::new())),
            memory_clears: Arc::new(StdMutex::new(0)),
            app_agent: None,
            fail_on: None,
        }
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_state(&mut self, state: AgentState) {
        self.states.lock().unwrap().push(state);
    }

    fn clear_memory(&mut self) {
        *self.memory_clears.lock().unwrap() += 1;
    }

    fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    fn active_app_agent(&self) -> Option<AgentHandle> {
        self.app_agent.clone()
    }

    async fn handle(&mut self, request: &str, _context: &SharedContext) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, request));
        self.blackboard.requests.add(request);
        if self.fail_on.as_deref() == Some(request) {
            anyhow::bail!("control not found for '{}'", request);
        }
        Ok(())
    }
}

// Agent tree handed out to every session: a host agent with one app agent
struct AgentTree {
    calls: CallLog,
    app_states: Arc<StdMutex<Vec<AgentState>>>,
    app_clears: Arc<StdMutex<usize>>,
    host_states: Arc<StdMutex<Vec<AgentState>>>,
    fail_on: Option<String>,
    with_app_agent: bool,
}

impl AgentTree {
    fn new() -> Self {
        Self {
            calls: Arc::new(StdMutex::new(Vec::new())),
            app_states: Arc::new(StdMutex::new(Vec::new())),
            app_clears: Arc::new(StdMutex::new(0)),
            host_states: Arc::new(StdMutex::new(Vec::new())),
            fail_on: None,
            with_app_agent: true,
        }
    }

    fn failing_on(mut self, request: &str) -> Self {
        self.fail_on = Some(request.to_string());
        self
    }

    fn without_app_agent(mut self) -> Self {
        self.with_app_agent = false;
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn builder(&self) -> impl Fn() -> AgentHandle + Send + Sync + 'static {
        let calls = self.calls.clone();
        let app_states = self.app_states.clone();
        let app_clears = self.app_clears.clone();
        let host_states = self.host_states.clone();
        let fail_on = self.fail_on.clone();
        let with_app_agent = self.with_app_agent;

        move || {
            let mut app = MockAgent::new("AppAgent", calls.clone());
            app.states = app_states.clone();
            app.memory_clears = app_clears.clone();
            app.fail_on = fail_on.clone();

            let mut host = MockAgent::new("HostAgent", calls.clone());
            host.states = host_states.clone();
            host.fail_on = fail_on.clone();
            if with_app_agent {
                let app: AgentHandle = Arc::new(Mutex::new(app));
                host.app_agent = Some(app);
            }
            Arc::new(Mutex::new(host)) as AgentHandle
        }
    }
}

struct RecordingEvaluator {
    seen: Arc<StdMutex<Vec<(String, Value, usize)>>>,
}

#[async_trait]
impl Evaluator for RecordingEvaluator {
    async fn evaluate(&self, task: &str, request: &Value, rounds: &[RoundRecord]) -> Result<Value> {
        self.seen
            .lock()
            .unwrap()
            .push((task.to_string(), request.clone(), rounds.len()));
        Ok(json!({ "complete": "yes", "rounds": rounds.len() }))
    }
}

fn base_config() -> Configuration {
    let mut config = ConfigurationLoader::get_default_config();
    config.experience.enabled = false;
    config
}

fn factory(config: Configuration, interactor: Arc<ScriptedInteractor>, tree: &AgentTree) -> SessionFactory {
    SessionFactory::new(config, interactor, Arc::new(tree.builder()))
}

fn write_plan(path: &Path, task: &str, steps: &[&str]) {
    let plan = json!({ "task": task, "object": "Excel", "steps": steps, "close": false });
    fs::write(path, serde_json::to_string(&plan).unwrap()).unwrap();
}

#[tokio::test]
async fn test_initial_request_skips_first_prompt() {
    let interactor = Arc::new(ScriptedInteractor::new().then("type hello", false).then("N", true));
    let tree = AgentTree::new();
    let factory = factory(base_config(), interactor.clone(), &tree);

    let mut sessions = factory
        .create_session("open_notepad", "normal", Path::new(""), "open notepad")
        .unwrap();
    assert_eq!(sessions.len(), 1);

    let summary = sessions[0].run().await.unwrap();

    assert_eq!(summary.total_rounds, 2);
    assert_eq!(summary.mode, SessionMode::Normal);
    assert_eq!(interactor.first_request_calls(), 0);
    assert_eq!(interactor.new_request_calls(), 2);
    assert_eq!(tree.calls(), vec!["HostAgent:open notepad", "HostAgent:type hello"]);
    assert_eq!(
        *tree.host_states.lock().unwrap(),
        vec![AgentState::ContinueHostAgent, AgentState::ContinueHostAgent]
    );
}

#[tokio::test]
async fn test_empty_initial_request_prompts_once() {
    let interactor = Arc::new(ScriptedInteractor::new().with_first_request("open notepad"));
    let tree = AgentTree::new();
    let factory = factory(base_config(), interactor.clone(), &tree);

    let mut sessions = factory
        .create_session("open_notepad", "normal", Path::new(""), "")
        .unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert_eq!(interactor.first_request_calls(), 1);
    assert_eq!(summary.total_rounds, 1);
    assert_eq!(tree.calls(), vec!["HostAgent:open notepad"]);
}

#[tokio::test]
async fn test_closed_terminal_input_ends_session() {
    let mut config = base_config();
    config.session.max_rounds = 50;
    let tree = AgentTree::new();
    let interactor = Arc::new(TerminalInteractor::with_reader(std::io::Cursor::new(Vec::<u8>::new())));
    let factory = SessionFactory::new(config, interactor, Arc::new(tree.builder()));

    let mut sessions = factory
        .create_session("t", "normal", Path::new(""), "open notepad")
        .unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert_eq!(summary.total_rounds, 1);
    assert!(sessions[0].core().book().finish());
    assert_eq!(tree.calls(), vec!["HostAgent:open notepad"]);
}

#[tokio::test]
async fn test_completion_is_permanent() {
    let interactor = Arc::new(ScriptedInteractor::new().then("N", true).then("late request", false));
    let tree = AgentTree::new();
    let factory = factory(base_config(), interactor.clone(), &tree);

    let mut sessions = factory
        .create_session("t", "normal", Path::new(""), "first")
        .unwrap();
    let session = &mut sessions[0];

    session.run().await.unwrap();
    assert!(session.is_finished());
    assert_eq!(session.state(), DriverState::Finished);
    assert_eq!(session.total_rounds(), 1);

    // A second run creates no rounds and asks nothing
    let summary = session.run().await.unwrap();
    assert_eq!(summary.total_rounds, 1);
    assert_eq!(interactor.new_request_calls(), 1);
}

#[tokio::test]
async fn test_follower_replays_plan_in_order() {
    let temp_dir = tempdir().unwrap();
    let plan = temp_dir.path().join("sum.json");
    write_plan(&plan, "Sum column A", &["Select column A", "Click AutoSum"]);

    let interactor = Arc::new(ScriptedInteractor::new());
    let tree = AgentTree::new();
    let factory = factory(base_config(), interactor.clone(), &tree);

    let mut sessions = factory.create_session("excel", "follower", &plan, "").unwrap();
    assert_eq!(sessions.len(), 1);
    let session = &mut sessions[0];
    assert_eq!(session.mode(), SessionMode::Follower);

    let summary = session.run().await.unwrap();

    let calls = tree.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].starts_with("HostAgent:Open and select the application of Excel,"));
    assert_eq!(calls[1], "AppAgent:Select column A");
    assert_eq!(calls[2], "AppAgent:Click AutoSum");

    assert_eq!(summary.total_rounds, 3);
    assert_eq!(*tree.app_clears.lock().unwrap(), 2);
    assert_eq!(
        *tree.app_states.lock().unwrap(),
        vec![AgentState::ContinueAppAgent, AgentState::ContinueAppAgent]
    );

    // Replays never prompt the user
    assert_eq!(interactor.first_request_calls(), 0);
    assert_eq!(interactor.new_request_calls(), 0);

    let context = session.core().context().read().await;
    assert_eq!(context.get_str(ContextName::Mode), Some("follower"));
    assert_eq!(context.get_u64(ContextName::CurrentRoundId), Some(2));
}

#[tokio::test]
async fn test_follower_with_empty_plan_creates_no_rounds() {
    let temp_dir = tempdir().unwrap();
    let plan = temp_dir.path().join("empty.json");
    write_plan(&plan, "Nothing", &[]);

    let tree = AgentTree::new();
    let factory = factory(base_config(), Arc::new(ScriptedInteractor::new()), &tree);

    let mut sessions = factory.create_session("t", "follower", &plan, "").unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert_eq!(summary.total_rounds, 0);
    assert!(tree.calls().is_empty());
}

#[tokio::test]
async fn test_follower_without_app_agent() {
    let temp_dir = tempdir().unwrap();
    let plan = temp_dir.path().join("plan.json");
    write_plan(&plan, "Sum", &["Click AutoSum"]);

    let tree = AgentTree::new().without_app_agent();
    let factory = factory(base_config(), Arc::new(ScriptedInteractor::new()), &tree);

    let mut sessions = factory.create_session("t", "follower", &plan, "").unwrap();
    let result = sessions[0].run().await;

    assert!(matches!(result, Err(SessionError::NoActiveAppAgent { round_id: 1 })));
    assert_eq!(sessions[0].total_rounds(), 1);
}

#[test]
fn test_batch_sessions_follow_sorted_file_names() {
    let temp_dir = tempdir().unwrap();
    for name in ["c", "a", "b"] {
        write_plan(&temp_dir.path().join(format!("{}.json", name)), name, &["step"]);
    }
    fs::write(temp_dir.path().join("readme.txt"), "not a plan").unwrap();

    let tree = AgentTree::new();
    let factory = factory(base_config(), Arc::new(ScriptedInteractor::new()), &tree);

    let sessions = factory
        .create_session("task", "follower", temp_dir.path(), "")
        .unwrap();

    let described: Vec<(usize, String)> = sessions
        .iter()
        .map(|s| (s.id(), s.task().to_string()))
        .collect();
    assert_eq!(
        described,
        vec![
            (0, "task/a".to_string()),
            (1, "task/b".to_string()),
            (2, "task/c".to_string()),
        ]
    );
}

#[test]
fn test_unsupported_mode_creates_nothing() {
    let tree = AgentTree::new();
    let factory = factory(base_config(), Arc::new(ScriptedInteractor::new()), &tree);

    let result = factory.create_session("t", "bogus", Path::new(""), "");
    assert!(matches!(result, Err(SessionError::Configuration { .. })));
}

#[test]
fn test_missing_plan_file() {
    let temp_dir = tempdir().unwrap();
    let tree = AgentTree::new();
    let factory = factory(base_config(), Arc::new(ScriptedInteractor::new()), &tree);

    let result = factory.create_session("t", "follower", &temp_dir.path().join("absent.json"), "");
    match result {
        Err(SessionError::ResourceAccess { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("missing plan must not create sessions"),
    }
}

#[tokio::test]
async fn test_failed_round_keeps_ids_contiguous() {
    let interactor = Arc::new(
        ScriptedInteractor::new()
            .then("click save", false)
            .then("N", true),
    );
    let tree = AgentTree::new().failing_on("click missing button");
    let factory = factory(base_config(), interactor, &tree);

    let mut sessions = factory
        .create_session("t", "normal", Path::new(""), "click missing button")
        .unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert_eq!(summary.total_rounds, 2);
    assert_eq!(summary.failed_rounds, vec![0]);

    let session = &sessions[0];
    let failed = session.round(0).unwrap();
    assert!(failed.status().is_failed());
    let next = session.round(1).unwrap();
    assert_eq!(next.id(), 1);
    assert_eq!(next.request(), "click save");
    assert_eq!(next.status(), &RoundStatus::Completed);
}

#[tokio::test]
async fn test_round_limit_ends_session() {
    let interactor = Arc::new(
        ScriptedInteractor::new()
            .then("two", false)
            .then("three", false)
            .then("four", false),
    );
    let mut config = base_config();
    config.session.max_rounds = 2;
    let tree = AgentTree::new();
    let factory = factory(config, interactor.clone(), &tree);

    let mut sessions = factory
        .create_session("t", "normal", Path::new(""), "one")
        .unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert_eq!(summary.total_rounds, 2);
    assert_eq!(tree.calls(), vec!["HostAgent:one", "HostAgent:two"]);
    assert_eq!(interactor.new_request_calls(), 1);
}

#[tokio::test]
async fn test_session_evaluation_is_logged_and_saved() {
    let temp_dir = tempdir().unwrap();
    let plan = temp_dir.path().join("sum.json");
    write_plan(&plan, "Sum column A", &["Click AutoSum"]);

    let mut config = base_config();
    config.session.eva_session = true;
    config.logging.log_dir = Some(temp_dir.path().join("logs").to_string_lossy().to_string());

    let seen = Arc::new(StdMutex::new(Vec::new()));
    let tree = AgentTree::new();
    let factory = factory(config, Arc::new(ScriptedInteractor::new()), &tree)
        .with_evaluator(Arc::new(RecordingEvaluator { seen: seen.clone() }));

    let mut sessions = factory.create_session("excel", "follower", &plan, "").unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert_eq!(summary.evaluation, Some(json!({ "complete": "yes", "rounds": 2 })));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("excel".to_string(), json!("Sum column A"), 2)]
    );

    let session_dir = temp_dir.path().join("logs").join("excel");
    let saved: Value = serde_json::from_str(&fs::read_to_string(session_dir.join("evaluation.json")).unwrap()).unwrap();
    assert_eq!(saved["complete"], "yes");

    let log = fs::read_to_string(session_dir.join("session.md")).unwrap();
    assert!(log.contains("Click AutoSum"));
}

#[tokio::test]
async fn test_interactive_evaluation_uses_request_history() {
    let mut config = base_config();
    config.session.eva_session = true;

    let seen = Arc::new(StdMutex::new(Vec::new()));
    let interactor = Arc::new(ScriptedInteractor::new().then("type hello", false));
    let tree = AgentTree::new();
    let factory = factory(config, interactor, &tree)
        .with_evaluator(Arc::new(RecordingEvaluator { seen: seen.clone() }));

    let mut sessions = factory
        .create_session("notes", "normal", Path::new(""), "open notepad")
        .unwrap();
    sessions[0].run().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, json!(["open notepad", "type hello"]));
}

#[tokio::test]
async fn test_experience_saved_when_user_agrees() {
    let temp_dir = tempdir().unwrap();
    let mut config = base_config();
    config.experience.enabled = true;
    config.experience.experience_dir = temp_dir.path().to_string_lossy().to_string();

    let interactor = Arc::new(ScriptedInteractor::new().save_experience(true));
    let tree = AgentTree::new();
    let factory = factory(config, interactor.clone(), &tree);

    let mut sessions = factory
        .create_session("open_notepad", "normal", Path::new(""), "open notepad")
        .unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert!(summary.experience_saved);
    assert_eq!(interactor.experience_calls(), 1);

    let content = fs::read_to_string(temp_dir.path().join("open_notepad.json")).unwrap();
    assert!(content.contains("\n    \"task\": \"open_notepad\""));
    let saved: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(saved["rounds"][0]["request"], "open notepad");
}

#[tokio::test]
async fn test_experience_not_saved_when_user_declines() {
    let temp_dir = tempdir().unwrap();
    let mut config = base_config();
    config.experience.enabled = true;
    config.experience.experience_dir = temp_dir.path().to_string_lossy().to_string();

    let tree = AgentTree::new();
    let factory = factory(config, Arc::new(ScriptedInteractor::new()), &tree);

    let mut sessions = factory
        .create_session("open_notepad", "normal", Path::new(""), "open notepad")
        .unwrap();
    let summary = sessions[0].run().await.unwrap();

    assert!(!summary.experience_saved);
    assert!(!temp_dir.path().join("open_notepad.json").exists());
}

#[cfg(feature = "cli")]
#[tokio::test]
async fn test_batch_runs_concurrently() {
    use sessionkit::cli::run_sessions;

    let temp_dir = tempdir().unwrap();
    for name in ["a", "b"] {
        write_plan(&temp_dir.path().join(format!("{}.json", name)), name, &["step one", "step two"]);
    }

    let tree = AgentTree::new();
    let factory = factory(base_config(), Arc::new(ScriptedInteractor::new()), &tree);
    let sessions = factory
        .create_session("batch", "follower", temp_dir.path(), "")
        .unwrap();

    let results = run_sessions(sessions, true).await;
    let summaries: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].task, "batch/a");
    assert_eq!(summaries[1].task, "batch/b");
    assert!(summaries.iter().all(|s| s.total_rounds == 3));
    assert_eq!(tree.calls().len(), 6);
}
