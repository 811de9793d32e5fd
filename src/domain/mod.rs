//! Domain layer - core types and the audit-log source port.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (network, IO, etc.).

pub mod error;
pub mod models;
pub mod scope;
pub mod settings;
pub mod source;

pub use error::{AppError, Result};
pub use models::{
    CapturedRecord, DeletionEvent, FolderType, LocalMediaFile, MediaReference, OriginalMessage,
    PassOutcome, PassReport, RunSummary, ThreadContext,
};
pub use scope::{CursorWindow, ExportMode, ExportRequest, ExportScope, ThreadSelector};
pub use settings::{AppConfig, ExportSettings, ViewerSettings};
pub use source::{AuditLogSource, ScopeHandle};
