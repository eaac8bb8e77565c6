//! The admitted, in-flight sync run.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::model::{Account, DataScope, MediaScope, Mode, SyncRequest};

use super::progress::{Progress, ProgressSnapshot};

/// Monotonic cancellation flag shared between the orchestrator and the worker.
///
/// Once set it stays set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `false` if it was already requested.
    pub fn request(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One admitted sync operation.
///
/// Shared as `Arc<Task>` between the orchestrator (which publishes it as
/// `current`) and the worker thread.
#[derive(Debug)]
pub struct Task {
    pub id: String,
    pub request: SyncRequest,
    pub progress: Arc<Progress>,
    account_name: String,
    cancel: CancelFlag,
    /// Unix milliseconds.
    pub started_at: i64,
}

impl Task {
    pub(crate) fn new(request: SyncRequest, smoothing: f64) -> Self {
        Self {
            id: format!("task_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            account_name: Account::unnamed(request.account_id).name,
            request,
            progress: Arc::new(Progress::new(smoothing)),
            cancel: CancelFlag::new(),
            started_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn account_id(&self) -> i64 {
        self.request.account_id
    }

    pub(crate) fn with_account_name(mut self, name: String) -> Self {
        self.account_name = name;
        self
    }

    /// Name of the account, resolved when the task was admitted.
    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.request.mode
    }

    #[must_use]
    pub fn data(&self) -> DataScope {
        self.request.data
    }

    #[must_use]
    pub fn media(&self) -> MediaScope {
        self.request.media
    }

    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.request.target.as_deref()
    }

    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    #[must_use]
    pub fn cancel_requested(&self) -> bool {
        self.cancel.is_requested()
    }

    pub(crate) fn request_cancel(&self) -> bool {
        self.cancel.request()
    }

    /// Display title: `<mode>` or `<mode> [<data>]`, then ` (NN%)` once
    /// progress is known, then ` (<account>)` when a name is given.
    ///
    /// Pass `None` for `account_name` in views already scoped to the account.
    #[must_use]
    pub fn title(&self, account_name: Option<&str>) -> String {
        let mut title = if self.data() == DataScope::All {
            self.mode().title().to_string()
        } else {
            format!("{} [{}]", self.mode().title(), self.data().title())
        };

        if let Some(percent) = self.progress.percent() {
            title.push_str(&format!(" ({:2}%)", percent as u32));
        }

        if let Some(name) = account_name {
            title.push_str(&format!(" ({name})"));
        }

        title
    }

    /// `Working`, plus the remaining-time estimate when there is one.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.progress.remaining_seconds() {
            Some(remaining) => format!("Working, {remaining:.2} seconds remaining"),
            None => "Working".to_string(),
        }
    }

    /// Serializable view for JSON output.
    #[must_use]
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id.clone(),
            account_id: self.account_id(),
            mode: self.mode(),
            data: self.data(),
            media: self.media(),
            target: self.request.target.clone(),
            started_at: self.started_at,
            cancel_requested: self.cancel_requested(),
            progress: self.progress.snapshot(),
        }
    }
}

/// Flattened copy of a [`Task`] for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: String,
    pub account_id: i64,
    pub mode: Mode,
    pub data: DataScope,
    pub media: MediaScope,
    pub target: Option<String>,
    pub started_at: i64,
    pub cancel_requested: bool,
    pub progress: ProgressSnapshot,
}
