//! Sync request options.

use serde::{Deserialize, Serialize};

use super::mode::{DataScope, MediaScope, Mode};

/// Everything needed to ask the orchestrator for a sync run.
///
/// Built with [`SyncRequest::new`] and the chained setters; data and media
/// scopes default to `All` and there is no target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub account_id: i64,
    pub mode: Mode,
    #[serde(default)]
    pub data: DataScope,
    #[serde(default)]
    pub media: MediaScope,
    /// Library section key, only meaningful for [`Mode::Push`].
    pub target: Option<String>,
}

impl SyncRequest {
    #[must_use]
    pub fn new(account_id: i64, mode: Mode) -> Self {
        Self {
            account_id,
            mode,
            data: DataScope::All,
            media: MediaScope::All,
            target: None,
        }
    }

    #[must_use]
    pub fn data(mut self, data: DataScope) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn media(mut self, media: MediaScope) -> Self {
        self.media = media;
        self
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Identity used for duplicate detection and history lookups.
    #[must_use]
    pub fn key(&self) -> (i64, Mode, Option<&str>) {
        (self.account_id, self.mode, self.target.as_deref())
    }
}
