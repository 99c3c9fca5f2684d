//! Session runner used by host binaries
//!
//! The host application supplies agents and an interactor through a
//! [`SessionFactory`]; this module resolves the mode, creates the sessions and
//! runs them.

use futures_util::future::join_all;
use std::path::Path;

use crate::cli::args::SessionArgs;
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{display_session_error, print_summary};
use crate::config::EnvironmentLoader;
use crate::session::{
    AgentBuilder, Interactor, RoundDriver, SessionFactory, SessionResult, SessionSummary,
};
use std::sync::Arc;

/// Factory configured from `--config` around the host's collaborators
pub fn build_factory(
    args: &SessionArgs,
    interactor: Arc<dyn Interactor>,
    agents: Arc<dyn AgentBuilder>,
) -> CliResult<SessionFactory> {
    let config = args.load_configuration()?;
    Ok(SessionFactory::new(config, interactor, agents))
}

/// Load configuration, build the factory and run the sessions in one step
pub async fn run(
    args: &SessionArgs,
    interactor: Arc<dyn Interactor>,
    agents: Arc<dyn AgentBuilder>,
) -> CliResult<Vec<SessionSummary>> {
    let factory = build_factory(args, interactor, agents)?;
    execute(&factory, args).await
}

/// Mode to run: `--mode`, then `SESSIONKIT_MODE`, then the configured default
pub fn resolve_mode(args: &SessionArgs, factory: &SessionFactory) -> String {
    args.mode
        .clone()
        .or_else(|| EnvironmentLoader::default().session_mode())
        .unwrap_or_else(|| factory.config().session.default_mode.clone())
}

/// Create the sessions described by `args` and run all of them.
///
/// Summaries come back in session id order. The first session error is
/// returned after every session has had its turn.
pub async fn execute(factory: &SessionFactory, args: &SessionArgs) -> CliResult<Vec<SessionSummary>> {
    let mode = resolve_mode(args, factory);
    args.validate(&mode).map_err(CliError::InvalidInput)?;

    let plan = args.plan.as_deref().unwrap_or(Path::new(""));
    let sessions = factory.create_session(&args.task, &mode, plan, &args.request)?;
    tracing::info!(task = %args.task, mode = %mode, count = sessions.len(), "sessions created");

    let results = run_sessions(sessions, args.concurrent).await;

    let mut summaries = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(summary) => {
                print_summary(&summary);
                summaries.push(summary);
            }
            Err(e) => {
                tracing::error!("{}", e);
                display_session_error(&e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(summaries),
    }
}

/// Run each session to completion, one after another or all at once.
///
/// Sessions share no mutable state, so running them concurrently does not
/// change any single session's rounds. Results keep the input order.
pub async fn run_sessions(
    mut sessions: Vec<Box<dyn RoundDriver>>,
    concurrent: bool,
) -> Vec<SessionResult<SessionSummary>> {
    if concurrent {
        return join_all(sessions.iter_mut().map(|s| s.run())).await;
    }

    let mut results = Vec::with_capacity(sessions.len());
    for session in sessions.iter_mut() {
        results.push(session.run().await);
    }
    results
}
