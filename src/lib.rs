//! Session Kit - round-driven task sessions for agents
//!
//! A session turns a task into a sequence of rounds, each one request handed
//! to an agent supplied by the host application. Sessions run either live,
//! asking the user for each request, or as a replay of a recorded plan.
//!
//! - **`config`** - TOML configuration and environment overrides
//! - **`observability`** - Markdown session logs and `tracing` events
//! - **`records`** - Zip extraction and indented JSON persistence
//! - **`session`** - Session factory, interactive and replay sessions, rounds
//! - **`cli`** - Argument parsing and session running for host binaries
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! sessionkit = { version = "0.1", features = ["session"] }
//! # Or enable everything:
//! sessionkit = { version = "0.1", features = ["all"] }
//! ```
//!
//! # Example: replaying a folder of plans
//!
//! ```ignore
//! use sessionkit::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! async fn replay(agents: Arc<dyn AgentBuilder>) -> SessionResult<()> {
//!     let loader = ConfigurationLoader::new(None).map_err(|e| SessionError::configuration(e.to_string()))?;
//!     let factory = SessionFactory::new(loader.config, Arc::new(TerminalInteractor::new()), agents);
//!
//!     for mut session in factory.create_session("excel", "follower", Path::new("plans/"), "")? {
//!         let summary = session.run().await?;
//!         println!("{}: {} rounds", summary.task, summary.total_rounds);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Observability utilities (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// Archive and JSON record helpers (enabled with the `records` feature)
#[cfg(feature = "records")]
pub mod records;

/// Sessions and rounds (enabled with the `session` feature)
#[cfg(feature = "session")]
pub mod session;

/// Session runner for host binaries (enabled with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    #[cfg(feature = "observability")]
    pub use crate::observability::Logger;

    #[cfg(feature = "records")]
    pub use crate::records::{save_to_json, unzip_and_read_file, RecordError, RecordResult};

    #[cfg(feature = "session")]
    pub use crate::session::{
        Agent, AgentBuilder, AgentHandle, AgentState, Context, ContextName, FollowerSession,
        Interactor, PlanReader, Round, RoundDriver, Session, SessionError, SessionFactory,
        SessionMode, SessionResult, SessionSummary, SharedContext, TerminalInteractor,
    };

    #[cfg(feature = "cli")]
    pub use crate::cli::{execute, run, run_sessions, SessionArgs};
}
