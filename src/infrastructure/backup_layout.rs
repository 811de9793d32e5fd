//! On-disk layout of the backup tree.
//!
//! ```text
//! backup/<group>/dump.json                      unscoped export
//! backup/<group>/thread_<id>/dump.json          one folder per thread
//! .../album_<grouped_id>/  .../msg_<id>/        media, beside the dump
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, ExportScope, Result};

use super::dump_store::DUMP_FILE_NAME;
use super::viewer_auth::is_protected_path;

const THREAD_PREFIX: &str = "thread_";

/// Folder holding everything exported for a group.
#[must_use]
pub fn group_dir(backup_root: &Path, group_id: i64) -> PathBuf {
    backup_root.join(group_id.unsigned_abs().to_string())
}

/// Folder holding the dump and media of one scope.
#[must_use]
pub fn scope_dir(backup_root: &Path, group_id: i64, thread_id: i64) -> PathBuf {
    let group = group_dir(backup_root, group_id);
    if thread_id == 0 {
        group
    } else {
        group.join(format!("{THREAD_PREFIX}{thread_id}"))
    }
}

/// Creates the scope folder of `scope` and returns it.
///
/// # Errors
/// Returns error if the folder cannot be created.
pub async fn prepare_scope_dir(backup_root: &Path, scope: &ExportScope) -> Result<PathBuf> {
    let dir = scope_dir(backup_root, scope.group_id, scope.thread_id);
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        AppError::io(format!("Failed to create backup folder {}", dir.display()), e)
    })?;
    Ok(dir)
}

/// Dump file of a scope folder.
#[must_use]
pub fn dump_path(scope_dir: &Path) -> PathBuf {
    scope_dir.join(DUMP_FILE_NAME)
}

/// A group folder found in the backup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListing {
    /// Folder name (the absolute group id).
    pub name: String,
    /// Whether an unscoped dump exists.
    pub has_dump: bool,
    /// Thread ids with their own folder, ascending.
    pub threads: Vec<i64>,
}

/// Lists groups and their threads under `backup_root`.
///
/// Entries named like `credentials_file` are never listed.
///
/// # Errors
/// Returns error if the backup folder exists but cannot be read.
pub fn list_groups(backup_root: &Path, credentials_file: &Path) -> Result<Vec<GroupListing>> {
    if !backup_root.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(backup_root)
        .map_err(|e| AppError::io("Failed to read backup folder", e))?;

    let mut groups = Vec::new();
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if is_protected_path(&name, credentials_file) {
            tracing::debug!(path = %path.display(), "Skipping credentials entry");
            continue;
        }
        if !path.is_dir() {
            continue;
        }

        groups.push(GroupListing {
            has_dump: dump_path(&path).is_file(),
            threads: list_threads(&path),
            name,
        });
    }

    groups.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(groups)
}

/// Thread ids with a `thread_<id>` folder inside a group folder.
fn list_threads(group_dir: &Path) -> Vec<i64> {
    let Ok(entries) = fs::read_dir(group_dir) else {
        tracing::warn!(path = %group_dir.display(), "Failed to read group folder");
        return Vec::new();
    };

    let mut threads: Vec<i64> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            e.file_name()
                .to_str()
                .and_then(|n| n.strip_prefix(THREAD_PREFIX))
                .and_then(|id| id.parse().ok())
        })
        .collect();

    threads.sort_unstable();
    threads
}
