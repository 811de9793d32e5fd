//! Audit-log source port.
//!
//! The network transport to the messaging service lives behind this trait;
//! the export engine only talks to it through these three calls.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::Result;
use super::models::{DeletionEvent, MediaReference};

/// Opaque handle to a resolved group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeHandle(pub String);

/// Capability to read deletion events and their attachments.
#[async_trait]
pub trait AuditLogSource: Send + Sync {
    /// Resolves a group id into a handle usable for log queries.
    async fn resolve_scope_handle(&self, group_id: i64) -> Result<ScopeHandle>;

    /// Returns at most `limit` deletion events with `min_id <= id <= max_id`,
    /// newest first. `max_id == 0` means no upper bound.
    async fn iter_deletion_events(
        &self,
        handle: &ScopeHandle,
        min_id: i64,
        max_id: i64,
        limit: usize,
    ) -> Result<Vec<DeletionEvent>>;

    /// Downloads an attachment into `destination` and returns the written file.
    async fn fetch_media(&self, media: &MediaReference, destination: &Path) -> Result<PathBuf>;
}
