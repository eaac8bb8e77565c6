//! Error types for the MediaSync CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, 6=queue, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::{QueueError, QueueErrorKind};

/// Result type alias for MediaSync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    AccountNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Queue (exit 6)
    SyncConflict,
    SyncUnavailable,

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
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::SyncConflict => "SYNC_CONFLICT",
            Self::SyncUnavailable => "SYNC_UNAVAILABLE",
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
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::AccountNotFound => 3,
            Self::InvalidArgument => 4,
            Self::SyncConflict | Self::SyncUnavailable => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the same call may succeed later without changes.
    ///
    /// Queue conflicts clear once the running sync finishes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SyncConflict | Self::SyncUnavailable | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in MediaSync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `msync init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Account not found: {id}")]
    AccountNotFound {
        id: i64,
        /// (id, name) of configured accounts for hint display.
        available: Vec<(i64, String)>,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            Self::Queue(e) => match e.kind {
                QueueErrorKind::InvalidRequest => ErrorCode::InvalidArgument,
                QueueErrorKind::Unavailable => ErrorCode::SyncUnavailable,
                _ => ErrorCode::SyncConflict,
            },
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
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
            Self::NotInitialized => {
                Some("Run `msync init` to create the history database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::AccountNotFound { available, .. } => {
                if available.is_empty() {
                    Some("No accounts configured. Add one to `accounts` in config.json.".to_string())
                } else {
                    let mut hint = String::from("Configured accounts:\n");
                    for (id, name) in available {
                        hint.push_str(&format!("    {id}  \"{name}\"\n"));
                    }
                    Some(hint.trim_end().to_string())
                }
            }

            Self::Queue(e) => match e.kind {
                QueueErrorKind::InvalidRequest => None,
                _ => Some("Wait for the running sync to finish, or cancel it first.".to_string()),
            },

            Self::InvalidArgument(msg) => {
                if msg.contains("mode") {
                    Some("Valid modes: full, pull, fast_pull, push. Synonyms: sync→full, quick→fast_pull".to_string())
                } else if msg.contains("data scope") {
                    Some(
                        "Valid data scopes: all, collection, playback, ratings, watched, watchlist, lists"
                            .to_string(),
                    )
                } else if msg.contains("media scope") {
                    Some("Valid media scopes: all, movies, shows".to_string())
                } else {
                    None
                }
            }

            Self::Database(_) | Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::Other(_) => {
                None
            }
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

        if let Self::Queue(e) = self {
            obj["error"]["title"] = serde_json::Value::String(e.title.clone());
        }

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
