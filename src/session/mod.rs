//! Session and round control flow
//!
//! A [`SessionFactory`] turns a task and a mode into one or more sessions.
//! Each session drives a sequence of [`Round`]s, one request per round,
//! against agents supplied by the host application:
//!
//! - [`Session`] asks the user for each request through an [`Interactor`]
//! - [`FollowerSession`] replays the steps of a recorded plan
//!
//! ```ignore
//! use sessionkit::config::ConfigurationLoader;
//! use sessionkit::session::{RoundDriver, SessionFactory, TerminalInteractor};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let loader = ConfigurationLoader::new(None)?;
//! let factory = SessionFactory::new(loader.config, Arc::new(TerminalInteractor::new()), Arc::new(build_host_agent));
//! for mut session in factory.create_session("open_notepad", "normal", Path::new(""), "")? {
//!     let summary = session.run().await?;
//!     println!("{} rounds", summary.total_rounds);
//! }
//! ```

pub mod agent;
pub mod basic;
pub mod context;
pub mod error;
pub mod experience;
pub mod factory;
pub mod follower;
pub mod interactive;
pub mod interactor;
pub mod plan_reader;
pub mod round;

pub use agent::{Agent, AgentBuilder, AgentHandle, AgentState, Blackboard, RequestMemory};
pub use basic::{
    DriverState, RoundBook, RoundDriver, SessionCore, SessionMode, SessionServices, SessionSummary,
};
pub use context::{Context, ContextName, SharedContext};
pub use error::{SessionError, SessionResult};
pub use experience::{Evaluator, ExperienceRecord, ExperienceRecorder, JsonExperienceRecorder};
pub use factory::SessionFactory;
pub use follower::FollowerSession;
pub use interactive::Session;
pub use interactor::{
    is_exit_answer, print_with_color, Interactor, ScriptedInteractor, TerminalInteractor,
    EXIT_ANSWER, WELCOME_TEXT,
};
pub use plan_reader::{Plan, PlanReader};
pub use round::{Round, RoundRecord, RoundStatus};
