//! Viewer credentials.
//!
//! The backup viewer gates access with a username/password pair read from a
//! local TOML file. That file sits next to the backup tree and must never be
//! served or listed.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Username used when no valid credentials file exists.
pub const DEFAULT_USERNAME: &str = "admin";
/// Password used when no valid credentials file exists.
pub const DEFAULT_PASSWORD: &str = "admin";

/// Username/password pair for the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewerCredentials {
    pub username: String,
    pub password: String,
}

impl Default for ViewerCredentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl ViewerCredentials {
    /// Reads credentials from `path`.
    ///
    /// A missing or invalid file falls back to `admin`/`admin` with a warning.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Viewer credentials unavailable, using default login"
                );
                return Self::default();
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(creds) if !creds.username.is_empty() => creds,
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Empty viewer username, using default login");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Invalid viewer credentials, using default login"
                );
                Self::default()
            }
        }
    }

    /// Whether the defaults are in effect.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.username == DEFAULT_USERNAME && self.password == DEFAULT_PASSWORD
    }
}

/// Whether a request path targets the credentials file itself.
#[must_use]
pub fn is_protected_path(request_path: &str, credentials_file: &Path) -> bool {
    let Some(protected) = credentials_file.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    let path = request_path.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|last| last.eq_ignore_ascii_case(protected))
}
