//! Structured persistence for session records
//!
//! Values are written as pretty-printed JSON with 4-space indentation. Writes go
//! through a temp file in the target directory and are renamed into place, so a
//! reader never observes a half-written record.

use super::{RecordError, RecordResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const JSON_INDENT: &[u8] = b"    ";

/// Record writer that uses the write-temp-rename pattern
pub struct AtomicRecordWriter {
    target_path: PathBuf,
    temp_path: PathBuf,
}

impl AtomicRecordWriter {
    /// Create a new writer for the target path
    pub fn new(target_path: &Path) -> RecordResult<Self> {
        let temp_path = Self::generate_temp_path(target_path)?;

        Ok(AtomicRecordWriter {
            target_path: target_path.to_path_buf(),
            temp_path,
        })
    }

    /// Write raw bytes to the target, creating missing parent directories
    pub fn write_bytes(&self, content: &[u8]) -> RecordResult<()> {
        if let Some(parent) = self.target_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.temp_path, content)?;
        self.commit()
    }

    /// Serialize `data` as 4-space indented JSON and write it
    pub fn write_json<T: Serialize + ?Sized>(&self, data: &T) -> RecordResult<()> {
        let content = to_indented_json(data)?;
        self.write_bytes(&content)
    }

    /// Commit the write by renaming the temp file onto the target.
    /// A failed rename is returned as the underlying I/O error.
    pub fn commit(&self) -> RecordResult<()> {
        fs::rename(&self.temp_path, &self.target_path)?;
        Ok(())
    }

    /// Remove the temp file if it is still around
    pub fn abort(&self) -> RecordResult<()> {
        if self.temp_path.exists() {
            fs::remove_file(&self.temp_path)?;
        }
        Ok(())
    }

    fn generate_temp_path(target: &Path) -> RecordResult<PathBuf> {
        let filename = target
            .file_name()
            .ok_or_else(|| RecordError::storage("Target path has no filename"))?;

        let temp_name = format!("{}.tmp.{}", filename.to_string_lossy(), Uuid::new_v4());

        Ok(match target.parent() {
            Some(parent) => parent.join(temp_name),
            None => PathBuf::from(temp_name),
        })
    }
}

impl Drop for AtomicRecordWriter {
    fn drop(&mut self) {
        let _ = self.abort();
    }
}

/// Serialize a value as pretty JSON with 4-space indentation
pub fn to_indented_json<T: Serialize + ?Sized>(data: &T) -> RecordResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    data.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Save a value to `output_path` as pretty-printed JSON.
///
/// Missing parent directories are created.
pub fn save_to_json<T: Serialize + ?Sized>(data: &T, output_path: &Path) -> RecordResult<()> {
    AtomicRecordWriter::new(output_path)?.write_json(data)
}

/// Load a JSON value previously written with [`save_to_json`]
pub fn load_json<T: DeserializeOwned>(path: &Path) -> RecordResult<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
