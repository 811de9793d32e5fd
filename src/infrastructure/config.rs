//! Configuration file management.
//!
//! Handles loading and creating the TOML configuration file.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# admin-log-backup configuration
# Auto-generated - edit as needed

[export]
# Audit-log events requested per page (default: 100)
page_size = 100

# Pause after each media download in milliseconds (default: 100)
pacing_ms = 100

# Root folder of the backup tree (default: backup)
backup_dir = "backup"

[viewer]
# Username/password file used by the backup viewer; never listed or served
credentials_file = "viewer_credentials.toml"
"#;

/// Load configuration, falling back to defaults.
///
/// A missing file yields the defaults silently; an unreadable or invalid file
/// yields the defaults with a warning.
#[must_use]
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return AppConfig::default();
    }

    match load_config_from_file(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring config file, using defaults");
            AppConfig::default()
        }
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Create the default configuration file if it doesn't exist.
///
/// Returns `true` if a file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.export.page_size, 100);
        assert_eq!(config.export.pacing_ms, 100);
    }

    #[test]
    fn test_ensure_then_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested/config.toml");

        assert!(ensure_config_exists(&config_path).unwrap());
        assert!(!ensure_config_exists(&config_path).unwrap());

        let loaded = load_config_from_file(&config_path).unwrap();
        assert_eq!(loaded.export.page_size, 100);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[export\npage_size = ").unwrap();

        assert!(load_config_from_file(&config_path).is_err());
        assert_eq!(load_config(&config_path).export.page_size, 100);
        assert_eq!(load_config(&dir.path().join("none.toml")).export.pacing_ms, 100);
    }
}
