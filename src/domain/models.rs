//! Domain models for deleted-message recovery.
//!
//! These models represent deletion events as delivered by the audit log and
//! the records persisted to a scope's dump file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{AppError, Result};

/// Thread membership marker carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadContext {
    /// The message has no reply or topic header.
    None,
    /// A plain reply to another message.
    PlainReply { target_id: i64 },
    /// A message inside a forum topic.
    ForumTopic { topic_root_id: i64 },
    /// A header is present but names neither a topic root nor a reply target.
    Unanchored,
}

impl ThreadContext {
    /// Builds the context from a raw `reply_to` header.
    ///
    /// A forum topic header without a topic root falls back to its reply target.
    #[must_use]
    pub fn from_reply_header(header: Option<&Value>) -> Self {
        let Some(header) = header.filter(|h| h.is_object()) else {
            return Self::None;
        };

        let is_topic = header
            .get("forum_topic")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let topic_root = header.get("reply_to_top_id").and_then(Value::as_i64);
        let target = header.get("reply_to_msg_id").and_then(Value::as_i64);

        match (is_topic, topic_root, target) {
            (true, Some(topic_root_id), _) => Self::ForumTopic { topic_root_id },
            (_, _, Some(target_id)) => Self::PlainReply { target_id },
            _ => Self::Unanchored,
        }
    }
}

/// Opaque handle to a message attachment, passed back to the source to fetch it.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaReference(pub Value);

/// Snapshot of a message as it existed before deletion.
#[derive(Debug, Clone)]
pub struct OriginalMessage {
    /// Message identifier within the group.
    pub message_id: i64,
    /// When the message was sent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Reply or topic membership.
    pub thread_context: ThreadContext,
    /// Album identifier shared by messages uploaded together.
    pub group_id: Option<i64>,
    /// Attachment, if any.
    pub media: Option<MediaReference>,
    /// Every field of the message as serialized by the source.
    pub raw: Map<String, Value>,
}

impl OriginalMessage {
    /// Projects a raw serialized message into its typed view.
    ///
    /// # Errors
    /// Returns error if the value is not an object or has no integer `id`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(raw) = value else {
            return Err(AppError::invalid("Message snapshot is not a JSON object"));
        };

        let message_id = raw
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| AppError::invalid("Message snapshot has no integer id"))?;

        let timestamp = raw
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<DateTime<Utc>>().ok());

        let media = raw
            .get("media")
            .filter(|m| !m.is_null())
            .cloned()
            .map(MediaReference);

        Ok(Self {
            message_id,
            timestamp,
            thread_context: ThreadContext::from_reply_header(raw.get("reply_to")),
            group_id: raw.get("grouped_id").and_then(Value::as_i64),
            media,
            raw,
        })
    }

    /// Whether the message carries an attachment.
    #[must_use]
    pub const fn has_media(&self) -> bool {
        self.media.is_some()
    }
}

/// A single audit-log entry reporting a deletion.
#[derive(Debug, Clone)]
pub struct DeletionEvent {
    /// Audit-log event identifier (the pagination key).
    pub event_id: i64,
    /// Whether the event is a message deletion.
    pub deleted: bool,
    /// User who performed the action.
    pub origin_user_id: i64,
    /// The deleted message.
    pub original_message: OriginalMessage,
}

/// Kind of media folder an attachment was stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    /// Folder exclusive to one message (`msg_<id>`).
    Message,
    /// Folder shared by an album (`album_<id>`).
    Album,
}

impl std::fmt::Display for FolderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Album => write!(f, "album"),
        }
    }
}

/// Where a downloaded attachment landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalMediaFile {
    /// Path relative to the dump file's folder.
    pub local_path: String,
    /// Absolute path on disk.
    pub absolute_path: String,
    /// File name only.
    pub filename: String,
    /// Album or single-message folder.
    pub folder_type: FolderType,
    /// Album id or message id the folder is keyed by.
    pub folder_id: i64,
}

/// A message as persisted in `dump.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedRecord {
    /// All fields of the original message.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Downloaded attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_media_file: Option<LocalMediaFile>,
}

impl CapturedRecord {
    /// Captures a message, optionally with its downloaded attachment.
    #[must_use]
    pub fn capture(message: &OriginalMessage, media: Option<LocalMediaFile>) -> Self {
        Self {
            fields: message.raw.clone(),
            local_media_file: media,
        }
    }

    /// Message identity (`id`, or `message_id` in hand-written dumps).
    #[must_use]
    pub fn message_id(&self) -> Option<i64> {
        self.fields
            .get("id")
            .or_else(|| self.fields.get("message_id"))
            .and_then(Value::as_i64)
    }

    /// Message text, empty if none.
    #[must_use]
    pub fn text(&self) -> &str {
        self.fields
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Raw `date` field.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.fields.get("date").and_then(Value::as_str)
    }
}

/// Why a pagination pass stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The source returned an empty page.
    Exhausted,
    /// The next window would fall below the lower id bound.
    LowerBoundReached,
    /// The source failed; partial results were still flushed.
    Aborted(String),
}

impl PassOutcome {
    /// Whether the pass ended because of a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

/// Progress counters for one pagination pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Thread the pass was scoped to (0 = unscoped).
    pub thread_id: i64,
    /// Number of page requests issued.
    pub fetch_calls: usize,
    /// Raw events received across all pages.
    pub events_seen: usize,
    /// Records appended to the dump.
    pub captured: usize,
    /// Attachments saved.
    pub media_saved: usize,
    /// Attachments that failed to download.
    pub media_failed: usize,
    /// Total records in the dump after the flush.
    pub total_records: usize,
    /// Why the pass stopped.
    pub outcome: PassOutcome,
}

impl PassReport {
    /// Empty report for a pass about to start.
    #[must_use]
    pub const fn new(thread_id: i64) -> Self {
        Self {
            thread_id,
            fetch_calls: 0,
            events_seen: 0,
            captured: 0,
            media_saved: 0,
            media_failed: 0,
            total_records: 0,
            outcome: PassOutcome::Exhausted,
        }
    }
}

/// Aggregate result of a run over several threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Threads a pass was attempted for.
    pub threads_processed: usize,
    /// Threads whose pass aborted or errored.
    pub threads_failed: usize,
    /// Records captured across all threads.
    pub records_captured: usize,
    /// Attachments saved across all threads.
    pub media_saved: usize,
}
