//! Queue rejection types.
//!
//! A rejected `queue()` call never touches orchestrator state; it only
//! produces one of these for the caller to display.

use serde::Serialize;
use thiserror::Error;

/// Why a sync request was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueErrorKind {
    /// The same account, mode and target is already running.
    Duplicate,
    /// A sync for a different account is running.
    OtherAccount,
    /// A run of equal or higher precedence for this account is running.
    Superseded,
    /// A lower-precedence run is in progress and there is no backlog.
    Busy,
    /// The request itself is malformed.
    InvalidRequest,
    /// The worker could not be started.
    Unavailable,
}

/// Rejection returned by [`Orchestrator::queue`](super::Orchestrator::queue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{title}: {message}")]
pub struct QueueError {
    pub kind: QueueErrorKind,
    /// Short heading, e.g. "Already Running".
    pub title: String,
    /// Full sentence for the caller to show.
    pub message: String,
}

impl QueueError {
    pub fn new(kind: QueueErrorKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    /// True for rejections caused by another active run.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self.kind,
            QueueErrorKind::Duplicate
                | QueueErrorKind::OtherAccount
                | QueueErrorKind::Superseded
                | QueueErrorKind::Busy
        )
    }
}
