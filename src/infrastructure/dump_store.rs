//! JSON dump file holding the captured records of one export scope.
//!
//! Loading is tolerant: a well-formed array, the legacy comma-joined form
//! (`{...},{...},` without brackets), and a missing or empty file are all
//! accepted, and anything unparseable is read as "no prior records".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, CapturedRecord, Result};

/// Name of the dump file inside a scope folder.
pub const DUMP_FILE_NAME: &str = "dump.json";

/// Loads the records stored at `path`.
///
/// # Errors
/// Returns error only if the file exists but cannot be read. Corrupt content
/// is logged and yields an empty list.
pub async fn load_records(path: &Path) -> Result<Vec<CapturedRecord>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::io(
                format!("Failed to read dump file: {}", path.display()),
                e,
            ))
        }
    };

    let Ok(content) = String::from_utf8(bytes) else {
        tracing::warn!(path = %path.display(), "Dump file is not UTF-8, starting empty");
        return Ok(Vec::new());
    };

    match parse_dump(&content) {
        Ok(records) => Ok(records),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable dump file, starting empty");
            Ok(Vec::new())
        }
    }
}

/// Parses dump content in either the array or the legacy comma-joined form.
fn parse_dump(content: &str) -> std::result::Result<Vec<CapturedRecord>, serde_json::Error> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(Vec::new());
    }

    if content.starts_with('[') {
        return serde_json::from_str(content);
    }

    let body = content.strip_suffix(',').unwrap_or(content);
    serde_json::from_str(&format!("[{body}]"))
}

/// Appends new records after the existing ones, keeping arrival order.
///
/// Records are not deduplicated by message id: overlapping runs append again.
#[must_use]
pub fn merge_records(
    mut existing: Vec<CapturedRecord>,
    new_records: Vec<CapturedRecord>,
) -> Vec<CapturedRecord> {
    existing.extend(new_records);
    existing
}

/// Writes `records` as one indented JSON array, replacing the file in place.
///
/// # Errors
/// Returns error if the folder cannot be created or the file cannot be written.
pub async fn save_records(path: &Path, records: &[CapturedRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::io("Failed to create dump directory", e))?;
    }

    let content = serde_json::to_string_pretty(records).map_err(AppError::json_parse)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::io(format!("Failed to write dump file: {}", path.display()), e))
}

/// In-memory record set of one scope, loaded at pass start and flushed at pass end.
#[derive(Debug)]
pub struct DumpStore {
    path: PathBuf,
    records: Vec<CapturedRecord>,
}

impl DumpStore {
    /// Opens the dump at `path`, loading any prior records.
    ///
    /// # Errors
    /// Returns error if an existing file cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = load_records(&path).await?;

        tracing::debug!(path = %path.display(), records = records.len(), "Loaded dump");

        Ok(Self { path, records })
    }

    /// Adds newly captured records.
    pub fn append(&mut self, new_records: Vec<CapturedRecord>) {
        let existing = std::mem::take(&mut self.records);
        self.records = merge_records(existing, new_records);
    }

    /// Writes the full record set back to disk.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub async fn flush(&self) -> Result<()> {
        save_records(&self.path, &self.records).await?;
        tracing::info!(
            path = %self.path.display(),
            records = self.records.len(),
            "Saved dump"
        );
        Ok(())
    }

    /// All records, prior ones first.
    #[must_use]
    pub fn records(&self) -> &[CapturedRecord] {
        &self.records
    }
}
