//! Contract between the orchestrator and the routine doing the actual sync.
//!
//! The worker owns item-by-item synchronization. It reports progress through
//! [`WorkContext::progress`], polls [`WorkContext::checkpoint`] at bounded
//! intervals, and returns exactly one [`Outcome`].

use std::fmt;
use std::sync::Arc;

use crate::model::{ErrorEntry, SyncRequest};

use super::progress::Progress;
use super::task::{CancelFlag, Task};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Finished with item-level errors, or aborted by one.
    Failed(Vec<ErrorEntry>),
    /// Stopped at a checkpoint after cancellation was requested.
    Cancelled,
}

impl Outcome {
    /// `Success` for an empty error list, `Failed` otherwise.
    #[must_use]
    pub fn from_errors(errors: Vec<ErrorEntry>) -> Self {
        if errors.is_empty() {
            Self::Success
        } else {
            Self::Failed(errors)
        }
    }

    /// A failure with a single error entry.
    pub fn failed(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Failed(vec![ErrorEntry::new(summary, detail)])
    }
}

impl From<Cancelled> for Outcome {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Returned by [`WorkContext::checkpoint`] once cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sync cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Handles a worker receives for one run.
#[derive(Debug, Clone)]
pub struct WorkContext {
    request: SyncRequest,
    progress: Arc<Progress>,
    cancel: CancelFlag,
}

impl WorkContext {
    pub(crate) fn for_task(task: &Task) -> Self {
        Self {
            request: task.request.clone(),
            progress: Arc::clone(&task.progress),
            cancel: task.cancel_flag().clone(),
        }
    }

    /// Build a context outside the orchestrator, e.g. to drive a worker directly.
    #[must_use]
    pub fn new(request: SyncRequest, progress: Arc<Progress>, cancel: CancelFlag) -> Self {
        Self {
            request,
            progress,
            cancel,
        }
    }

    #[must_use]
    pub fn request(&self) -> &SyncRequest {
        &self.request
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_requested()
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.cancel.is_requested() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The routine the orchestrator schedules.
pub trait SyncWorker: Send + Sync {
    fn run(&self, ctx: &WorkContext) -> Outcome;
}

impl<F> SyncWorker for F
where
    F: Fn(&WorkContext) -> Outcome + Send + Sync,
{
    fn run(&self, ctx: &WorkContext) -> Outcome {
        self(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;

    fn context() -> WorkContext {
        WorkContext::new(
            SyncRequest::new(1, Mode::Pull),
            Arc::new(Progress::default()),
            CancelFlag::new(),
        )
    }

    #[test]
    fn test_from_errors() {
        assert_eq!(Outcome::from_errors(Vec::new()), Outcome::Success);
        assert!(matches!(
            Outcome::from_errors(vec![ErrorEntry::new("a", "b")]),
            Outcome::Failed(errors) if errors.len() == 1
        ));
    }

    #[test]
    fn test_checkpoint_after_cancel() {
        let cancel = CancelFlag::new();
        let ctx = WorkContext::new(
            SyncRequest::new(1, Mode::Pull),
            Arc::new(Progress::default()),
            cancel.clone(),
        );
        assert!(ctx.checkpoint().is_ok());
        cancel.request();
        assert_eq!(ctx.checkpoint(), Err(Cancelled));
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_closure_worker_with_question_mark() {
        fn body(ctx: &WorkContext) -> Result<Outcome, Cancelled> {
            ctx.checkpoint()?;
            ctx.progress().set_percent(100.0);
            Ok(Outcome::Success)
        }

        let worker = |ctx: &WorkContext| body(ctx).unwrap_or_else(Outcome::from);
        let ctx = context();
        assert_eq!(worker.run(&ctx), Outcome::Success);
        assert_eq!(ctx.progress().percent(), Some(100.0));
    }
}
