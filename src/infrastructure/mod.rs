//! Infrastructure layer - external adapters (filesystem, replayed audit log).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod backup_layout;
pub mod config;
pub mod dump_store;
pub mod replay_source;
pub mod viewer_auth;

pub use backup_layout::{dump_path, list_groups, prepare_scope_dir, scope_dir, GroupListing};
pub use config::{ensure_config_exists, load_config};
pub use dump_store::{load_records, merge_records, save_records, DumpStore, DUMP_FILE_NAME};
pub use replay_source::ReplaySource;
pub use viewer_auth::{is_protected_path, ViewerCredentials};
