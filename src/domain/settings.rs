//! Application configuration models.
//!
//! Values loaded from `config.toml`; command-line flags override them.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for export passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Events requested per audit-log page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Pause after each media download, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Root of the backup tree.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            pacing_ms: default_pacing_ms(),
            backup_dir: default_backup_dir(),
        }
    }
}

const fn default_page_size() -> usize {
    100
}

const fn default_pacing_ms() -> u64 {
    100
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backup")
}

/// Settings shared with the backup viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSettings {
    /// File holding the viewer's username and password.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
        }
    }
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("viewer_credentials.toml")
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Export pass configuration.
    #[serde(default)]
    pub export: ExportSettings,

    /// Viewer configuration.
    #[serde(default)]
    pub viewer: ViewerSettings,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".admin-log-backup")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Pause after each media download.
    #[must_use]
    pub const fn pacing(&self) -> Duration {
        Duration::from_millis(self.export.pacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.export.page_size, 100);
        assert_eq!(config.pacing(), Duration::from_millis(100));
        assert_eq!(config.export.backup_dir, PathBuf::from("backup"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str("[export]\npage_size = 50\n").unwrap();
        assert_eq!(config.export.page_size, 50);
        assert_eq!(config.export.pacing_ms, 100);
        assert_eq!(
            config.viewer.credentials_file,
            PathBuf::from("viewer_credentials.toml")
        );
    }
}
