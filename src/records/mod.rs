//! Session record helpers
//!
//! Small I/O helpers used around sessions:
//! - extracting zipped plans or logs next to the archive
//! - persisting structured values as indented JSON
//!
//! # Example
//!
//! ```no_run
//! use sessionkit::records::{save_to_json, unzip_and_read_file};
//! use std::path::Path;
//!
//! let plan = unzip_and_read_file(Path::new("records/plan.zip")).unwrap();
//! save_to_json(&serde_json::json!({ "plan": plan }), Path::new("out/plan.json")).unwrap();
//! ```

pub mod archive;
pub mod error;
pub mod persistence;

pub use archive::{extraction_dir, unzip_and_read_file, unzip_file};
pub use error::{RecordError, RecordResult};
pub use persistence::{load_json, save_to_json, to_indented_json, AtomicRecordWriter};
