//! Configuration management for session runs.
//!
//! Configuration is loaded once from a TOML file by the entry point and handed
//! to the [`SessionFactory`](crate::session::SessionFactory) as an explicit
//! value; nothing reads it from global state.
//!
//! # Example
//!
//! ```no_run
//! use sessionkit::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(None);
//! let loader = ConfigurationLoader::new(Some(Path::new("config/sessionkit.toml"))).unwrap();
//!
//! println!("Evaluate sessions: {}", loader.config.session.eva_session);
//! println!("Mode override: {:?}", env.session_mode());
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    AgentConfig, Configuration, ConfigurationLoader, ExperienceConfig, LoggingConfig,
    SessionConfig,
};
pub use self::environment::EnvironmentLoader;
