//! File-backed audit-log source.
//!
//! Serves deletion events from a JSON export of a group's admin log and
//! resolves attachments against a local media folder. Accepted layouts:
//!
//! ```json
//! [{"id": 1001, "deleted": true, "user_id": 42, "message": {"id": 17, ...}}]
//! {"group_id": 123, "events": [ ... ]}
//! ```
//!
//! Media references are objects naming a file: `{"file": "photo.jpg"}`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    AppError, AuditLogSource, DeletionEvent, MediaReference, OriginalMessage, Result, ScopeHandle,
};

/// Raw event as stored in the export file.
#[derive(Debug, Deserialize)]
struct RawEvent {
    id: i64,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    user_id: i64,
    #[serde(default)]
    message: Option<Value>,
}

impl RawEvent {
    /// Converts to a deletion event, or `None` when the snapshot is unusable.
    fn into_event(self) -> Option<DeletionEvent> {
        let Some(message) = self.message.filter(|m| !m.is_null()) else {
            tracing::warn!(event = self.id, "Skipping event without a message snapshot");
            return None;
        };

        match OriginalMessage::from_value(message) {
            Ok(original_message) => Some(DeletionEvent {
                event_id: self.id,
                deleted: self.deleted,
                origin_user_id: self.user_id,
                original_message,
            }),
            Err(e) => {
                tracing::warn!(event = self.id, error = %e, "Skipping event with unreadable snapshot");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExport {
    Scoped { group_id: i64, events: Vec<RawEvent> },
    Bare(Vec<RawEvent>),
}

/// Audit-log source replaying a recorded export.
#[derive(Debug)]
pub struct ReplaySource {
    group_id: Option<u64>,
    /// Sorted newest first.
    events: Vec<DeletionEvent>,
    media_root: Option<PathBuf>,
    fetch_calls: AtomicUsize,
}

impl ReplaySource {
    /// Builds a source over in-memory events.
    #[must_use]
    pub fn from_events(mut events: Vec<DeletionEvent>) -> Self {
        events.sort_by(|a, b| b.event_id.cmp(&a.event_id));
        Self {
            group_id: None,
            events,
            media_root: None,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Restricts the source to one group; other groups fail to resolve.
    #[must_use]
    pub const fn for_group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id.unsigned_abs());
        self
    }

    /// Resolves media references against files in `root`.
    #[must_use]
    pub fn with_media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.media_root = Some(root.into());
        self
    }

    /// Loads an export file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid export.
    pub async fn open(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::io(format!("Failed to read events file: {}", path.display()), e))?;

        Self::parse(&content)
    }

    /// Parses export content.
    ///
    /// Events without a usable message snapshot are skipped with a warning.
    ///
    /// # Errors
    /// Returns error if the content is not a valid export.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawExport = serde_json::from_str(content).map_err(AppError::json_parse)?;
        let (group_id, raw_events) = match raw {
            RawExport::Scoped { group_id, events } => (Some(group_id.unsigned_abs()), events),
            RawExport::Bare(events) => (None, events),
        };

        let total = raw_events.len();
        let events: Vec<DeletionEvent> =
            raw_events.into_iter().filter_map(RawEvent::into_event).collect();

        tracing::debug!(
            events = events.len(),
            skipped = total - events.len(),
            "Loaded replay events"
        );

        let mut source = Self::from_events(events);
        source.group_id = group_id;
        Ok(source)
    }

    /// Number of page requests served so far.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AuditLogSource for ReplaySource {
    async fn resolve_scope_handle(&self, group_id: i64) -> Result<ScopeHandle> {
        let group_id = group_id.unsigned_abs();
        match self.group_id {
            Some(expected) if expected != group_id => Err(AppError::transport(format!(
                "Group {group_id} not found in replay export (holds {expected})"
            ))),
            _ => Ok(ScopeHandle(format!("replay:{group_id}"))),
        }
    }

    async fn iter_deletion_events(
        &self,
        _handle: &ScopeHandle,
        min_id: i64,
        max_id: i64,
        limit: usize,
    ) -> Result<Vec<DeletionEvent>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);

        Ok(self
            .events
            .iter()
            .filter(|e| e.event_id >= min_id && (max_id == 0 || e.event_id <= max_id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_media(&self, media: &MediaReference, destination: &Path) -> Result<PathBuf> {
        let root = self
            .media_root
            .as_deref()
            .ok_or_else(|| AppError::download("No media folder configured"))?;

        let filename = media
            .0
            .get("file")
            .and_then(Value::as_str)
            .and_then(|f| Path::new(f).file_name())
            .ok_or_else(|| AppError::download("Media reference names no file"))?;

        let target = destination.join(filename);
        tokio::fs::copy(root.join(filename), &target)
            .await
            .map_err(|e| {
                AppError::download(format!(
                    "Failed to copy {}: {e}",
                    Path::new(filename).display()
                ))
            })?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const EXPORT: &str = r#"{"group_id": -100, "events": [
        {"id": 1, "deleted": true, "user_id": 7, "message": {"id": 11}},
        {"id": 3, "deleted": true, "user_id": 7, "message": {"id": 13}},
        {"id": 2, "deleted": false, "user_id": 8, "message": {"id": 12}}
    ]}"#;

    #[tokio::test]
    async fn test_pages_are_newest_first_and_bounded() {
        let source = ReplaySource::parse(EXPORT).unwrap();
        let handle = source.resolve_scope_handle(100).await.unwrap();

        let page = source.iter_deletion_events(&handle, 0, 0, 2).await.unwrap();
        let ids: Vec<_> = page.iter().map(|e| e.event_id).collect();
        assert_eq!(ids, vec![3, 2]);

        let page = source.iter_deletion_events(&handle, 2, 2, 10).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].original_message.message_id, 12);
        assert_eq!(source.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_group_fails_to_resolve() {
        let source = ReplaySource::parse(EXPORT).unwrap();
        let err = source.resolve_scope_handle(200).await.unwrap_err();
        assert!(matches!(err, AppError::Transport { .. }));
        assert!(source.resolve_scope_handle(-100).await.is_ok());
        assert!(source.resolve_scope_handle(i64::MIN).await.is_err());
    }

    #[tokio::test]
    async fn test_events_without_usable_snapshot_are_skipped() {
        let source = ReplaySource::parse(
            r#"[
                {"id": 3, "deleted": true, "message": {"id": 13}},
                {"id": 2, "deleted": false, "message": null},
                {"id": 4, "deleted": false},
                {"id": 5, "deleted": true, "message": {"text": "no id"}},
                {"id": 1, "deleted": true, "message": {"id": 11}}
            ]"#,
        )
        .unwrap();

        let handle = source.resolve_scope_handle(1).await.unwrap();
        let page = source.iter_deletion_events(&handle, 0, 0, 10).await.unwrap();
        let ids: Vec<_> = page.iter().map(|e| e.event_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_fetch_media_copies_file() {
        let media = tempdir().unwrap();
        let out = tempdir().unwrap();
        std::fs::write(media.path().join("a.jpg"), b"jpeg").unwrap();

        let source = ReplaySource::parse("[]").unwrap().with_media_root(media.path());
        let reference = MediaReference(serde_json::json!({"file": "../a.jpg"}));
        let path = source.fetch_media(&reference, out.path()).await.unwrap();

        assert_eq!(path, out.path().join("a.jpg"));
        assert_eq!(std::fs::read(path).unwrap(), b"jpeg");

        let missing = MediaReference(serde_json::json!({"file": "b.jpg"}));
        assert!(source.fetch_media(&missing, out.path()).await.is_err());
    }
}
