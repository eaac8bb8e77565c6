//! Persisted outcome of a finished sync run.

use serde::{Deserialize, Serialize};

use super::mode::{DataScope, MediaScope, Mode};

/// One item-level error captured during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Short, single-line description (shown in status lines).
    pub summary: String,
    /// Longer detail, e.g. the underlying error chain.
    pub detail: String,
}

impl ErrorEntry {
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// A sync result record.
///
/// Records are append-only: once written they are never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Row id, assigned by the store (0 until recorded).
    pub id: i64,
    pub account_id: i64,
    pub mode: Mode,
    pub data: DataScope,
    pub media: MediaScope,
    pub target: Option<String>,
    /// Unix milliseconds.
    pub started_at: Option<i64>,
    /// Unix milliseconds. Always present on recorded results.
    pub ended_at: Option<i64>,
    pub success: bool,
    /// The run stopped because cancellation was requested.
    pub cancelled: bool,
    /// Errors in recording order; empty on success.
    pub errors: Vec<ErrorEntry>,
}

impl SyncResult {
    /// Errors in the order they were recorded.
    #[must_use]
    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Wall time between start and end, when both are known.
    #[must_use]
    pub fn elapsed_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).max(0)),
            _ => None,
        }
    }

    /// Short lowercase state label for listings.
    #[must_use]
    pub fn state_label(&self) -> &'static str {
        if self.success {
            "success"
        } else if self.cancelled {
            "cancelled"
        } else {
            "failed"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool, cancelled: bool) -> SyncResult {
        SyncResult {
            id: 0,
            account_id: 1,
            mode: Mode::Full,
            data: DataScope::All,
            media: MediaScope::All,
            target: None,
            started_at: Some(1_000),
            ended_at: Some(4_500),
            success,
            cancelled,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(result(true, false).elapsed_ms(), Some(3_500));

        let mut open = result(true, false);
        open.ended_at = None;
        assert_eq!(open.elapsed_ms(), None);
    }

    #[test]
    fn test_state_label() {
        assert_eq!(result(true, false).state_label(), "success");
        assert_eq!(result(false, true).state_label(), "cancelled");
        assert_eq!(result(false, false).state_label(), "failed");
    }
}
