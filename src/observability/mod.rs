//! Observability utilities for session runs.
//!
//! Sessions write a markdown transcript through [`Logger`] and emit `tracing`
//! events for the console; install any `tracing` subscriber to see them.
//!
//! # Example
//!
//! ```no_run
//! use sessionkit::observability::Logger;
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! let logger = Logger::for_session(Path::new("logs"), "open_notepad", Some("DEBUG")).unwrap();
//!
//! logger.log_session_start("open_notepad", "normal", &HashMap::new()).unwrap();
//! logger.log_round_start(0, "open notepad", "HostAgent").unwrap();
//! logger.log_completion("user finished", 1).unwrap();
//! ```

pub mod logger;

// Re-export main types for convenience
pub use logger::Logger;
