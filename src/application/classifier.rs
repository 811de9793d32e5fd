//! Deletion-event classification.
//!
//! Decides whether a raw audit-log event is a qualifying deletion and
//! projects the deleted message out of it.

use crate::domain::{DeletionEvent, ExportScope, OriginalMessage};

/// Why an event was dropped on its way to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The event is not a message deletion.
    NotDeletion,
    /// The deleted message lies below the scope's `min_id`.
    BelowMinId,
    /// Deleted by someone other than the filtered user.
    OtherUser,
    /// Not part of the requested thread.
    OutsideThread,
    /// Excluded by the export mode.
    ModeMismatch,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDeletion => write!(f, "not a deletion"),
            Self::BelowMinId => write!(f, "below minimum id"),
            Self::OtherUser => write!(f, "deleted by another user"),
            Self::OutsideThread => write!(f, "outside thread"),
            Self::ModeMismatch => write!(f, "excluded by mode"),
        }
    }
}

/// Returns the deleted message if `event` is a deletion at or above `min_id`.
///
/// # Errors
/// Returns the [`Rejection`] reason for events that do not qualify.
pub const fn classify<'a>(
    event: &'a DeletionEvent,
    scope: &ExportScope,
) -> Result<&'a OriginalMessage, Rejection> {
    if !event.deleted {
        return Err(Rejection::NotDeletion);
    }
    if event.original_message.message_id < scope.min_id {
        return Err(Rejection::BelowMinId);
    }
    Ok(&event.original_message)
}
