//! Application layer - use cases and orchestration.
//!
//! This layer contains the export engine: classification, filtering,
//! media grouping, pagination, and per-thread orchestration.

pub mod classifier;
pub mod exporter;
pub mod filter;
pub mod formatter;
pub mod media;
pub mod orchestrator;

pub use classifier::{classify, Rejection};
pub use exporter::{ExportPass, PassOptions};
pub use filter::select;
pub use formatter::{
    format_groups, format_pass_report, format_records_json, format_records_table,
    format_summary, OutputFormat,
};
pub use media::{resolve_media, MediaFolder};
pub use orchestrator::run_export;
