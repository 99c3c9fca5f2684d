//! Zip archive extraction for recorded plans and logs

use super::{RecordError, RecordResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Directory an archive is extracted into: a sibling of the archive named
/// after it without its extension (`records/run.zip` -> `records/run`).
pub fn extraction_dir(zip_file_path: &Path) -> PathBuf {
    zip_file_path.with_extension("")
}

/// Extract `zip_file_path` into its sibling directory and return the path of
/// the extracted file.
///
/// The extracted file is the first entry, in file name order, of the
/// extraction directory. Archives are expected to hold a single entry.
pub fn unzip_file(zip_file_path: &Path) -> RecordResult<PathBuf> {
    let folder = extraction_dir(zip_file_path);
    fs::create_dir_all(&folder)?;

    let file = File::open(zip_file_path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(&folder)?;

    let mut entries = fs::read_dir(&folder)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    entries
        .into_iter()
        .next()
        .ok_or_else(|| RecordError::empty_archive(zip_file_path))
}

/// Extract the archive and return the UTF-8 content of the extracted file
pub fn unzip_and_read_file(zip_file_path: &Path) -> RecordResult<String> {
    let extracted = unzip_file(zip_file_path)?;
    Ok(fs::read_to_string(extracted)?)
}
