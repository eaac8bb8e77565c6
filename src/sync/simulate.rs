//! Stand-in worker that exercises the orchestrator without a remote service.
//!
//! Processes a fixed number of units with a per-unit delay and fails the
//! first `failures` of them, so progress, cancellation and error history
//! can be observed end to end.

use std::thread;
use std::time::Duration;

use tracing::trace;

use crate::model::ErrorEntry;

use super::worker::{Outcome, SyncWorker, WorkContext};

#[derive(Debug, Clone)]
pub struct SimulatedWorker {
    pub items: u64,
    pub failures: u64,
    pub delay: Duration,
}

impl Default for SimulatedWorker {
    fn default() -> Self {
        Self {
            items: 20,
            failures: 0,
            delay: Duration::from_millis(100),
        }
    }
}

impl SimulatedWorker {
    #[must_use]
    pub fn new(items: u64, failures: u64, delay: Duration) -> Self {
        Self {
            items,
            failures,
            delay,
        }
    }
}

impl SyncWorker for SimulatedWorker {
    fn run(&self, ctx: &WorkContext) -> Outcome {
        let request = ctx.request();
        let progress = ctx.progress();
        let mut errors = Vec::new();

        progress.start(self.items);

        for item in 1..=self.items {
            if ctx.checkpoint().is_err() {
                return Outcome::Cancelled;
            }

            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }

            if item <= self.failures {
                errors.push(ErrorEntry::new(
                    format!("Unable to sync item #{item}"),
                    format!(
                        "simulated failure for account {} ({} mode)",
                        request.account_id, request.mode
                    ),
                ));
            }

            trace!(item, total = self.items, "Processed item");
            progress.step(1);
        }

        progress.finish();
        Outcome::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, SyncRequest};
    use crate::sync::progress::Progress;
    use crate::sync::task::CancelFlag;
    use std::sync::Arc;

    fn context(cancel: &CancelFlag) -> WorkContext {
        WorkContext::new(
            SyncRequest::new(1, Mode::Full),
            Arc::new(Progress::default()),
            cancel.clone(),
        )
    }

    #[test]
    fn test_success_reaches_100() {
        let ctx = context(&CancelFlag::new());
        let outcome = SimulatedWorker::new(5, 0, Duration::ZERO).run(&ctx);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(ctx.progress().percent(), Some(100.0));
    }

    #[test]
    fn test_injected_failures_in_order() {
        let ctx = context(&CancelFlag::new());
        let outcome = SimulatedWorker::new(5, 2, Duration::ZERO).run(&ctx);
        let Outcome::Failed(errors) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].summary, "Unable to sync item #1");
        assert_eq!(errors[1].summary, "Unable to sync item #2");
    }

    #[test]
    fn test_cancel_before_start() {
        let cancel = CancelFlag::new();
        cancel.request();
        let ctx = context(&cancel);
        let outcome = SimulatedWorker::new(5, 0, Duration::ZERO).run(&ctx);
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(ctx.progress().percent(), Some(0.0));
    }
}
