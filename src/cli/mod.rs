//! CLI feature - argument parsing and session running for host binaries
//!
//! No binary ships with the crate: agents belong to the host application,
//! which parses [`SessionArgs`] and hands them to [`run`] together with its
//! interactor and agent builder. [`build_factory`] and [`execute`] split that
//! into its two steps.
//!
//! # Example
//!
//! ```rust,ignore
//! use clap::Parser;
//! use sessionkit::cli::{display_error_with_suggestions, run, SessionArgs};
//!
//! let args = SessionArgs::parse();
//! if let Err(e) = run(&args, Arc::new(TerminalInteractor::new()), Arc::new(build_host_agent)).await {
//!     display_error_with_suggestions(&e, "Session run failed", Some("my-agent"));
//! }
//! ```

pub mod args;
pub mod error;
pub mod runner;
pub mod utils;

pub use args::SessionArgs;
pub use error::{CliError, CliResult};
pub use runner::{build_factory, execute, resolve_mode, run, run_sessions};
pub use utils::*;
