//! Pagination driver for one export pass.
//!
//! Walks the audit log downward in fixed-size pages, runs every event through
//! the classifier and filter chain, downloads attachments, and flushes the
//! scope's dump on every exit path, including a failed page request.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{
    AppConfig, AuditLogSource, CapturedRecord, DeletionEvent, ExportScope, PassOutcome,
    PassReport, Result,
};
use crate::infrastructure::{dump_path, DumpStore};

use super::filter::select;
use super::media::resolve_media;

/// Tuning for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOptions {
    /// Events requested per page.
    pub page_size: usize,
    /// Pause after each media download.
    pub pacing: Duration,
}

impl PassOptions {
    #[must_use]
    pub fn new(page_size: usize, pacing: Duration) -> Self {
        Self {
            page_size: page_size.max(1),
            pacing,
        }
    }
}

impl Default for PassOptions {
    fn default() -> Self {
        Self::new(100, Duration::from_millis(100))
    }
}

impl From<&AppConfig> for PassOptions {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.export.page_size, config.pacing())
    }
}

/// One pagination pass over a single scope.
pub struct ExportPass<'a, S: AuditLogSource + ?Sized> {
    source: &'a S,
    scope: ExportScope,
    scope_dir: PathBuf,
    options: PassOptions,
}

impl<'a, S: AuditLogSource + ?Sized> ExportPass<'a, S> {
    /// Creates a pass writing into `scope_dir`.
    pub fn new(
        source: &'a S,
        scope: ExportScope,
        scope_dir: impl Into<PathBuf>,
        options: PassOptions,
    ) -> Self {
        Self {
            source,
            scope,
            scope_dir: scope_dir.into(),
            options,
        }
    }

    /// Runs the pass to completion.
    ///
    /// Source failures end the pass with [`PassOutcome::Aborted`]; whatever was
    /// captured before the failure is still written.
    ///
    /// # Errors
    /// Returns error if the existing dump cannot be read or the dump cannot be
    /// written.
    pub async fn run(&self) -> Result<PassReport> {
        let mut store = DumpStore::open(dump_path(&self.scope_dir)).await?;
        let mut report = PassReport::new(self.scope.thread_id);
        let mut captured = Vec::new();

        let outcome = match self.paginate(&mut captured, &mut report).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    thread = self.scope.thread_id,
                    captured = report.captured,
                    error = %e,
                    "Export pass aborted"
                );
                PassOutcome::Aborted(e.to_string())
            }
        };
        report.outcome = outcome;

        store.append(captured);
        store.flush().await?;
        report.total_records = store.records().len();

        Ok(report)
    }

    async fn paginate(
        &self,
        captured: &mut Vec<CapturedRecord>,
        report: &mut PassReport,
    ) -> Result<PassOutcome> {
        let handle = self
            .source
            .resolve_scope_handle(self.scope.group_id)
            .await?;
        let mut window = self.scope.window();

        loop {
            let page = self
                .source
                .iter_deletion_events(
                    &handle,
                    window.min_id,
                    window.max_id,
                    self.options.page_size,
                )
                .await?;
            report.fetch_calls += 1;

            let Some(last_event_id) = page.last().map(|e| e.event_id) else {
                tracing::info!(thread = self.scope.thread_id, "Loading complete, no new messages");
                return Ok(PassOutcome::Exhausted);
            };

            tracing::debug!(
                events = page.len(),
                min_id = window.min_id,
                max_id = window.max_id,
                "Fetched page"
            );
            report.events_seen += page.len();

            for event in &page {
                if let Some(record) = self.capture(event, report).await {
                    captured.push(record);
                }
            }

            if !window.advance_past(last_event_id) {
                tracing::info!(thread = self.scope.thread_id, "Reached the lower message id limit");
                return Ok(PassOutcome::LowerBoundReached);
            }
        }
    }

    /// Turns one event into a record, downloading its attachment if any.
    async fn capture(&self, event: &DeletionEvent, report: &mut PassReport) -> Option<CapturedRecord> {
        let message = match select(event, &self.scope) {
            Ok(message) => message,
            Err(reason) => {
                tracing::trace!(event = event.event_id, %reason, "Skipped event");
                return None;
            }
        };

        let media = if message.has_media() {
            let file = resolve_media(self.source, message, &self.scope_dir).await;
            if let Some(ref file) = file {
                report.media_saved += 1;
                tracing::info!(
                    count = report.media_saved,
                    id = message.message_id,
                    path = %file.local_path,
                    "Saved media file"
                );
            } else {
                report.media_failed += 1;
            }
            tokio::time::sleep(self.options.pacing).await;
            file
        } else {
            None
        };

        report.captured += 1;
        tracing::info!(
            count = report.captured,
            id = message.message_id,
            date = ?message.timestamp,
            deleted_by = event.origin_user_id,
            "Saved message"
        );

        Some(CapturedRecord::capture(message, media))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    use crate::domain::{
        AppError, ExportMode, FolderType, MediaReference, OriginalMessage, ScopeHandle,
    };
    use crate::infrastructure::{load_records, ReplaySource};

    fn deletion(event_id: i64, user: i64, message: Value) -> DeletionEvent {
        DeletionEvent {
            event_id,
            deleted: true,
            origin_user_id: user,
            original_message: OriginalMessage::from_value(message).unwrap(),
        }
    }

    fn text_events(count: i64) -> Vec<DeletionEvent> {
        (1..=count)
            .map(|id| deletion(id, 7, json!({"id": id, "message": format!("m{id}")})))
            .collect()
    }

    fn options() -> PassOptions {
        PassOptions::new(100, Duration::ZERO)
    }

    /// Replays events but fails page requests from `fail_on_call` onward.
    struct FlakySource {
        inner: ReplaySource,
        fail_on_call: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuditLogSource for FlakySource {
        async fn resolve_scope_handle(&self, group_id: i64) -> Result<ScopeHandle> {
            self.inner.resolve_scope_handle(group_id).await
        }

        async fn iter_deletion_events(
            &self,
            handle: &ScopeHandle,
            min_id: i64,
            max_id: i64,
            limit: usize,
        ) -> Result<Vec<DeletionEvent>> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
            if call >= self.fail_on_call {
                return Err(AppError::transport("connection reset"));
            }
            self.inner
                .iter_deletion_events(handle, min_id, max_id, limit)
                .await
        }

        async fn fetch_media(&self, media: &MediaReference, destination: &Path) -> Result<PathBuf> {
            self.inner.fetch_media(media, destination).await
        }
    }

    #[tokio::test]
    async fn test_two_pages_then_lower_bound() {
        let dir = tempdir().unwrap();
        let source = ReplaySource::from_events(text_events(103));

        let pass = ExportPass::new(&source, ExportScope::whole_group(100), dir.path(), options());
        let report = pass.run().await.unwrap();

        assert_eq!(source.fetch_calls(), 2);
        assert_eq!(report.fetch_calls, 2);
        assert_eq!(report.events_seen, 103);
        assert_eq!(report.captured, 103);
        assert_eq!(report.outcome, PassOutcome::LowerBoundReached);

        let records = load_records(&dir.path().join("dump.json")).await.unwrap();
        assert_eq!(records.len(), 103);
        assert_eq!(records[0].message_id(), Some(103));
        assert_eq!(records[102].message_id(), Some(1));
    }

    #[tokio::test]
    async fn test_empty_page_exhausts_pass() {
        let dir = tempdir().unwrap();
        let events = vec![
            deletion(500, 7, json!({"id": 50})),
            deletion(499, 7, json!({"id": 49})),
        ];
        let source = ReplaySource::from_events(events);

        let mut scope = ExportScope::whole_group(100);
        scope.min_id = 40;

        let report = ExportPass::new(&source, scope, dir.path(), options())
            .run()
            .await
            .unwrap();

        assert_eq!(report.fetch_calls, 2);
        assert_eq!(report.captured, 2);
        assert_eq!(report.outcome, PassOutcome::Exhausted);
    }

    #[tokio::test]
    async fn test_records_respect_bounds() {
        let dir = tempdir().unwrap();
        let source = ReplaySource::from_events(text_events(60));

        let mut scope = ExportScope::whole_group(100);
        scope.min_id = 20;
        scope.max_id = 45;

        let report = ExportPass::new(&source, scope, dir.path(), PassOptions::new(10, Duration::ZERO))
            .run()
            .await
            .unwrap();

        let ids: Vec<i64> = load_records(&dir.path().join("dump.json"))
            .await
            .unwrap()
            .iter()
            .filter_map(CapturedRecord::message_id)
            .collect();

        assert_eq!(report.captured, 26);
        assert!(ids.iter().all(|&id| (20..=45).contains(&id)));
        assert_eq!(report.outcome, PassOutcome::LowerBoundReached);
    }

    #[tokio::test]
    async fn test_transport_error_still_flushes() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("dump.json"), r#"[{"id": 1000}]"#).unwrap();

        let source = FlakySource {
            inner: ReplaySource::from_events(text_events(25)),
            fail_on_call: 2,
            calls: AtomicUsize::new(0),
        };

        let report = ExportPass::new(&source, ExportScope::whole_group(100), dir.path(), PassOptions::new(10, Duration::ZERO))
            .run()
            .await
            .unwrap();

        assert!(report.outcome.is_failure());
        assert_eq!(report.captured, 10);
        assert_eq!(report.total_records, 11);

        let records = load_records(&dir.path().join("dump.json")).await.unwrap();
        assert_eq!(records.len(), 11);
        assert_eq!(records[0].message_id(), Some(1000));
    }

    #[tokio::test]
    async fn test_unresolvable_group_aborts_with_flush() {
        let dir = tempdir().unwrap();
        let source = ReplaySource::from_events(text_events(3)).for_group(1);

        let report = ExportPass::new(&source, ExportScope::whole_group(2), dir.path(), options())
            .run()
            .await
            .unwrap();

        assert!(report.outcome.is_failure());
        assert_eq!(report.fetch_calls, 0);
        assert!(dir.path().join("dump.json").is_file());
    }

    #[tokio::test]
    async fn test_media_only_with_user_filter_and_albums() {
        let media = tempdir().unwrap();
        let out = tempdir().unwrap();
        std::fs::write(media.path().join("a.jpg"), b"a").unwrap();
        std::fs::write(media.path().join("b.jpg"), b"b").unwrap();

        let events = vec![
            deletion(14, 7, json!({"id": 4, "grouped_id": 555, "media": {"file": "a.jpg"}})),
            deletion(13, 7, json!({"id": 3, "grouped_id": 555, "media": {"file": "b.jpg"}})),
            deletion(12, 7, json!({"id": 2, "message": "text only"})),
            deletion(11, 8, json!({"id": 1, "media": {"file": "a.jpg"}})),
            deletion(10, 7, json!({"id": 0, "media": {"file": "missing.jpg"}})),
        ];
        let source = ReplaySource::from_events(events).with_media_root(media.path());

        let mut scope = ExportScope::whole_group(100);
        scope.mode = ExportMode::MediaOnly;
        scope.filter_user_id = 7;

        let report = ExportPass::new(&source, scope, out.path(), options())
            .run()
            .await
            .unwrap();

        assert_eq!(report.captured, 3);
        assert_eq!(report.media_saved, 2);
        assert_eq!(report.media_failed, 1);

        let records = load_records(&out.path().join("dump.json")).await.unwrap();
        assert!(records.iter().all(|r| r.fields.contains_key("media")));

        let albums: Vec<_> = records
            .iter()
            .filter_map(|r| r.local_media_file.as_ref())
            .collect();
        assert_eq!(albums.len(), 2);
        assert!(albums
            .iter()
            .all(|f| f.folder_type == FolderType::Album && f.folder_id == 555));
        assert!(out.path().join("album_555/a.jpg").is_file());
        assert!(out.path().join("album_555/b.jpg").is_file());

        // The failed download is kept without a descriptor.
        assert!(records[2].local_media_file.is_none());
    }

    #[tokio::test]
    async fn test_text_only_never_downloads() {
        let out = tempdir().unwrap();
        let events = vec![
            deletion(2, 7, json!({"id": 2, "media": {"file": "a.jpg"}})),
            deletion(1, 7, json!({"id": 1, "message": "hello"})),
        ];
        let source = ReplaySource::from_events(events);

        let mut scope = ExportScope::whole_group(100);
        scope.mode = ExportMode::TextOnly;

        let report = ExportPass::new(&source, scope, out.path(), options())
            .run()
            .await
            .unwrap();

        assert_eq!(report.captured, 1);
        assert_eq!(report.media_saved + report.media_failed, 0);
        assert!(!out.path().join("msg_2").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_follows_media_downloads_only() {
        let media = tempdir().unwrap();
        let out = tempdir().unwrap();
        std::fs::write(media.path().join("a.jpg"), b"a").unwrap();

        let events = vec![
            deletion(5, 7, json!({"id": 5, "media": {"file": "a.jpg"}})),
            deletion(4, 7, json!({"id": 4, "message": "one"})),
            deletion(3, 7, json!({"id": 3, "media": {"file": "gone.jpg"}})),
            deletion(2, 7, json!({"id": 2, "message": "two"})),
            deletion(1, 7, json!({"id": 1, "message": "three"})),
        ];
        let source = ReplaySource::from_events(events).with_media_root(media.path());
        let pacing = Duration::from_secs(5);

        let started = tokio::time::Instant::now();
        let report = ExportPass::new(
            &source,
            ExportScope::whole_group(100),
            out.path(),
            PassOptions::new(100, pacing),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(report.captured, 5);
        assert_eq!(report.media_saved, 1);
        assert_eq!(report.media_failed, 1);
        // One pause per attachment, failed or not; text events add none.
        assert_eq!(started.elapsed(), pacing * 2);
    }
}
