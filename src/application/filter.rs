//! Filter chain applied to classified deletions.
//!
//! Order: user filter, thread filter, mode filter.

use crate::domain::{DeletionEvent, ExportMode, ExportScope, OriginalMessage, ThreadContext};

use super::classifier::{classify, Rejection};

/// Keeps only deletions by `filter_user_id` (0 keeps everything).
#[must_use]
pub const fn passes_user_filter(origin_user_id: i64, filter_user_id: i64) -> bool {
    filter_user_id == 0 || origin_user_id == filter_user_id
}

/// Whether `message` belongs to thread `thread_id` (0 keeps everything).
///
/// A topic root takes precedence over a reply target. A header naming neither
/// counts as outside the thread, and a message without a header belongs only
/// to the thread it is the root of.
#[must_use]
pub const fn passes_thread_filter(message: &OriginalMessage, thread_id: i64) -> bool {
    if thread_id == 0 {
        return true;
    }

    match message.thread_context {
        ThreadContext::ForumTopic { topic_root_id } => topic_root_id == thread_id,
        ThreadContext::PlainReply { target_id } => target_id == thread_id,
        ThreadContext::Unanchored => false,
        ThreadContext::None => message.message_id == thread_id,
    }
}

/// Whether `message` fits the export mode.
#[must_use]
pub const fn passes_mode_filter(message: &OriginalMessage, mode: ExportMode) -> bool {
    match mode {
        ExportMode::All => true,
        ExportMode::MediaOnly => message.has_media(),
        ExportMode::TextOnly => !message.has_media(),
    }
}

/// Runs classification and the whole filter chain over one event.
///
/// # Errors
/// Returns the first [`Rejection`] the event hits.
pub fn select<'a>(
    event: &'a DeletionEvent,
    scope: &ExportScope,
) -> Result<&'a OriginalMessage, Rejection> {
    let message = classify(event, scope)?;

    if !passes_user_filter(event.origin_user_id, scope.filter_user_id) {
        return Err(Rejection::OtherUser);
    }
    if !passes_thread_filter(message, scope.thread_id) {
        return Err(Rejection::OutsideThread);
    }
    if !passes_mode_filter(message, scope.mode) {
        return Err(Rejection::ModeMismatch);
    }

    Ok(message)
}
