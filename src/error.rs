//! Error types for quotesync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=storage, 4=validation, 6=sync, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Transport failures against the remote endpoint never show up here: the
//! gateway recovers them locally (see [`crate::remote`]).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for quotesync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Storage (exit 2)
    StorageError,
    CorruptSnapshot,

    // Validation (exit 4)
    InvalidArgument,
    RequiredField,

    // Sync (exit 6)
    SyncError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::StorageError => "STORAGE_ERROR",
            Self::CorruptSnapshot => "CORRUPT_SNAPSHOT",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::SyncError => "SYNC_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::StorageError | Self::CorruptSnapshot => 2,
            Self::InvalidArgument | Self::RequiredField => 4,
            Self::SyncError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying (possibly with corrected input) can succeed.
    ///
    /// Storage failures are retryable: the in-memory state is kept and the
    /// next persist attempt writes it again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::RequiredField | Self::StorageError | Self::SyncError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in quotesync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to persist records to {path}: {message}")]
    Storage { path: PathBuf, message: String },

    #[error("Record snapshot at {path} is unreadable: {message}")]
    CorruptSnapshot { path: PathBuf, message: String },

    #[error("Missing required field: {0}")]
    RequiredField(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Storage { .. } => ErrorCode::StorageError,
            Self::CorruptSnapshot { .. } => ErrorCode::CorruptSnapshot,
            Self::RequiredField(_) => ErrorCode::RequiredField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Sync(_) => ErrorCode::SyncError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Storage { path, .. } => Some(format!(
                "Check that {} is writable. Unsaved changes are kept in memory \
                 and written on the next successful save.",
                path.display()
            )),
            Self::CorruptSnapshot { path, .. } => Some(format!(
                "Fix or move {} aside; a fresh default collection is created when it is missing.",
                path.display()
            )),
            Self::RequiredField(field) => Some(format!(
                "Both `text` and `category` must be non-empty (missing: {field})"
            )),
            Self::Config(_) => Some(
                "Use `qsync config` to see the resolved configuration, \
                 or pass --endpoint / --store explicitly"
                    .to_string(),
            ),
            Self::InvalidArgument(_)
            | Self::Sync(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_retryable_with_hint() {
        let err = Error::Storage {
            path: PathBuf::from("/tmp/records.json"),
            message: "read-only file system".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.error_code().is_retryable());
        assert!(err.hint().unwrap().contains("/tmp/records.json"));
    }

    #[test]
    fn test_structured_json_shape() {
        let err = Error::RequiredField("category".to_string());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "REQUIRED_FIELD");
        assert_eq!(json["error"]["exit_code"], 4);
        assert!(json["error"]["hint"].as_str().unwrap().contains("category"));
    }

    #[test]
    fn test_other_has_no_hint() {
        let err = Error::Other("boom".to_string());
        assert!(err.hint().is_none());
        assert!(err.to_structured_json()["error"].get("hint").is_none());
    }
}
