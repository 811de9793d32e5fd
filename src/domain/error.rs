//! Domain-level error types for admin-log-backup.
//!
//! All errors are typed with `thiserror`. Most of them are recovered close to
//! where they happen; only configuration and local I/O failures reach `main`.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The audit-log source failed (query, scope resolution, connection).
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A single media item could not be fetched or stored.
    #[error("Download failed: {message}")]
    Download { message: String },

    /// Invalid or rejected run configuration.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a download error.
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
        }
    }

    /// Create an invalid-data error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_context() {
        let err = AppError::io(
            "Failed to write dump",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "IO error: Failed to write dump");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_transport_message() {
        let err = AppError::transport("flood wait");
        assert_eq!(err.to_string(), "Transport error: flood wait");
    }
}
