//! Admin Log Backup - recover deleted messages and media from a group's audit log.
//!
//! The export engine walks the admin log downward page by page, keeps the
//! deletions that match the requested scope, stores attachments in per-message
//! or per-album folders, and appends the recovered messages to a JSON dump per
//! group or thread.

pub mod application;
pub mod domain;
pub mod infrastructure;
