//! Single-slot sync orchestrator.
//!
//! Holds at most one active [`Task`]. `queue` decides admission and
//! publishes the task inside one critical section, so two concurrent calls
//! can never both be admitted. The worker runs on its own thread; when it
//! returns, the result is recorded and the slot is cleared, in that order.

use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::model::{Account, AccountDirectory, Mode, SyncRequest, SyncResult};
use crate::storage::ResultStore;

use super::admission::{self, ActiveRun, ModePrecedence};
use super::progress::DEFAULT_SMOOTHING;
use super::task::Task;
use super::types::{QueueError, QueueErrorKind};
use super::worker::{Outcome, SyncWorker, WorkContext};

/// Tunables for admission and progress estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    pub precedence: ModePrecedence,
    /// EMA smoothing factor for remaining-time estimates.
    pub smoothing: f64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            precedence: ModePrecedence::default(),
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

struct Shared {
    current: Mutex<Option<Arc<Task>>>,
    store: Arc<dyn ResultStore>,
    worker: Arc<dyn SyncWorker>,
    accounts: Arc<dyn AccountDirectory>,
    settings: OrchestratorSettings,
}

/// Owns the active-task slot and dispatches runs to the worker.
///
/// Cheap to clone; clones share the same slot.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("current", &self.current().map(|t| t.id.clone()))
            .field("settings", &self.shared.settings)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator with default settings and no account names.
    pub fn new(store: Arc<dyn ResultStore>, worker: Arc<dyn SyncWorker>) -> Self {
        Self::with_parts(store, worker, Arc::new(Vec::<Account>::new()), OrchestratorSettings::default())
    }

    pub fn with_parts(
        store: Arc<dyn ResultStore>,
        worker: Arc<dyn SyncWorker>,
        accounts: Arc<dyn AccountDirectory>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: Mutex::new(None),
                store,
                worker,
                accounts,
                settings,
            }),
        }
    }

    /// Request a sync run.
    ///
    /// Returns as soon as the worker thread is started. Rejections leave
    /// state untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`QueueError`] when admission is refused or the worker
    /// thread cannot be spawned.
    pub fn queue(&self, request: SyncRequest) -> std::result::Result<Arc<Task>, QueueError> {
        let account_name = self.shared.accounts.name(request.account_id);
        let mut current = self.shared.current.lock();

        if let Err(rejection) = self.shared.admit(current.as_deref(), &request) {
            info!(
                account_id = request.account_id,
                mode = %request.mode,
                section = request.target.as_deref(),
                kind = ?rejection.kind,
                "Sync request rejected"
            );
            return Err(rejection);
        }

        let task = Arc::new(Task::new(request, self.shared.settings.smoothing).with_account_name(account_name));
        *current = Some(Arc::clone(&task));

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&task);
        let spawned = thread::Builder::new()
            .name(format!("sync-{}", task.mode()))
            .spawn(move || shared.execute(&running));

        if let Err(e) = spawned {
            *current = None;
            error!(error = %e, task_id = %task.id, "Failed to spawn sync worker");
            return Err(QueueError::new(
                QueueErrorKind::Unavailable,
                "Sync Unavailable",
                format!("Unable to start the sync worker: {e}"),
            ));
        }

        info!(
            task_id = %task.id,
            account_id = task.account_id(),
            mode = %task.mode(),
            data = %task.data(),
            media = %task.media(),
            section = task.target(),
            "Sync started"
        );
        Ok(task)
    }

    /// Snapshot of the active task, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Task>> {
        self.shared.current.lock().clone()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.shared.current.lock().is_none()
    }

    /// Ask the active task to stop at its next checkpoint.
    ///
    /// Returns `false` when nothing is running. Does not wait for the worker.
    pub fn cancel(&self) -> bool {
        let current = self.shared.current.lock();
        let Some(task) = current.as_ref() else {
            debug!("Cancel requested while idle");
            return false;
        };

        if task.request_cancel() {
            info!(task_id = %task.id, mode = %task.mode(), "Sync cancellation requested");
        } else {
            debug!(task_id = %task.id, "Sync cancellation already requested");
        }
        true
    }

    /// Latest recorded result for `(account, mode, target)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn latest(&self, account_id: i64, mode: Mode, target: Option<&str>) -> Result<Option<SyncResult>> {
        self.shared.store.latest(account_id, mode, target)
    }

    /// Display name for an account id.
    #[must_use]
    pub fn account_name(&self, account_id: i64) -> String {
        self.shared.accounts.name(account_id)
    }

    #[must_use]
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.shared.settings
    }
}

impl Shared {
    fn admit(&self, current: Option<&Task>, request: &SyncRequest) -> std::result::Result<(), QueueError> {
        let Some(task) = current else {
            return admission::admit(&self.settings.precedence, None, request);
        };

        let active = ActiveRun {
            request: &task.request,
            account_name: task.account_name(),
        };
        admission::admit(&self.settings.precedence, Some(active), request)
    }

    /// Worker thread body.
    fn execute(&self, task: &Arc<Task>) {
        let ctx = WorkContext::for_task(task);
        debug!(task_id = %task.id, "Worker running");

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.worker.run(&ctx))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(task_id = %task.id, panic = %message, "Sync worker panicked");
                Outcome::failed("Sync worker crashed", message)
            }
        };

        self.finish(task, outcome);
    }

    /// Record the result, then release the slot.
    fn finish(&self, task: &Arc<Task>, outcome: Outcome) {
        let result = build_result(task, outcome, chrono::Utc::now().timestamp_millis());

        match self.store.record(&result) {
            Ok(id) => info!(
                task_id = %task.id,
                result_id = id,
                state = result.state_label(),
                errors = result.errors.len(),
                "Sync finished"
            ),
            Err(e) => error!(
                task_id = %task.id,
                error = %e,
                state = result.state_label(),
                "Failed to record sync result"
            ),
        }

        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|active| Arc::ptr_eq(active, task)) {
            *current = None;
        } else {
            warn!(task_id = %task.id, "Finished task was not the active task");
        }
    }
}

fn build_result(task: &Task, outcome: Outcome, ended_at: i64) -> SyncResult {
    let (success, cancelled, errors) = match outcome {
        Outcome::Success => (true, false, Vec::new()),
        Outcome::Failed(errors) => (false, false, errors),
        Outcome::Cancelled => (false, true, Vec::new()),
    };

    SyncResult {
        id: 0,
        account_id: task.account_id(),
        mode: task.mode(),
        data: task.data(),
        media: task.media(),
        target: task.request.target.clone(),
        started_at: Some(task.started_at),
        ended_at: Some(ended_at.max(task.started_at)),
        success,
        cancelled,
        errors,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ErrorEntry;
    use crate::storage::MemoryStore;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    /// Worker that blocks until released, reporting cancellation if requested.
    fn gated_worker() -> (Arc<dyn SyncWorker>, mpsc::Sender<Outcome>) {
        let (tx, rx) = mpsc::channel::<Outcome>();
        let rx = Mutex::new(rx);
        let worker = move |ctx: &WorkContext| loop {
            if ctx.is_cancelled() {
                return Outcome::Cancelled;
            }
            if let Ok(outcome) = rx.lock().recv_timeout(Duration::from_millis(5)) {
                return outcome;
            }
        };
        let worker: Arc<dyn SyncWorker> = Arc::new(worker);
        (worker, tx)
    }

    fn wait_idle(orch: &Orchestrator) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !orch.is_idle() {
            assert!(Instant::now() < deadline, "orchestrator never went idle");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_queue_publishes_current() {
        let store = Arc::new(MemoryStore::new());
        let (worker, release) = gated_worker();
        let orch = Orchestrator::new(store.clone(), worker);

        let task = orch.queue(SyncRequest::new(1, Mode::Full)).unwrap();
        let current = orch.current().unwrap();
        assert!(Arc::ptr_eq(&task, &current));
        assert_eq!(current.mode(), Mode::Full);

        release.send(Outcome::Success).unwrap();
        wait_idle(&orch);
        assert!(orch.current().is_none());
        assert!(orch.latest(1, Mode::Full, None).unwrap().unwrap().success);
    }

    #[test]
    fn test_duplicate_rejected_without_state_change() {
        let store = Arc::new(MemoryStore::new());
        let (worker, release) = gated_worker();
        let orch = Orchestrator::new(store.clone(), worker);

        let first = orch.queue(SyncRequest::new(1, Mode::Pull)).unwrap();
        let err = orch.queue(SyncRequest::new(1, Mode::Pull)).unwrap_err();
        assert_eq!(err.kind, QueueErrorKind::Duplicate);
        assert!(Arc::ptr_eq(&first, &orch.current().unwrap()));

        release.send(Outcome::Success).unwrap();
        wait_idle(&orch);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cancel_when_idle() {
        let (worker, _release) = gated_worker();
        let orch = Orchestrator::new(Arc::new(MemoryStore::new()), worker);
        assert!(!orch.cancel());
    }

    #[test]
    fn test_cancel_records_cancelled_result() {
        let store = Arc::new(MemoryStore::new());
        let (worker, _release) = gated_worker();
        let orch = Orchestrator::new(store.clone(), worker);

        orch.queue(SyncRequest::new(2, Mode::Push).target("show-section")).unwrap();
        assert!(orch.cancel());
        assert!(orch.cancel(), "cancel stays true while the task is still active");
        wait_idle(&orch);

        let result = store.latest(2, Mode::Push, Some("show-section")).unwrap().unwrap();
        assert!(!result.success);
        assert!(result.cancelled);
        assert!(result.errors.is_empty());
        assert!(result.ended_at.is_some());
    }

    #[test]
    fn test_worker_panic_recorded_as_failure() {
        let store = Arc::new(MemoryStore::new());
        let worker = |_: &WorkContext| -> Outcome { panic!("remote exploded") };
        let orch = Orchestrator::new(store.clone(), Arc::new(worker));

        orch.queue(SyncRequest::new(1, Mode::FastPull)).unwrap();
        wait_idle(&orch);

        let result = store.latest(1, Mode::FastPull, None).unwrap().unwrap();
        assert!(!result.success);
        assert_eq!(result.errors, vec![ErrorEntry::new("Sync worker crashed", "remote exploded")]);
    }

    #[test]
    fn test_store_failure_still_clears_slot() {
        struct BrokenStore;

        impl ResultStore for BrokenStore {
            fn record(&self, _: &SyncResult) -> Result<i64> {
                Err(crate::error::Error::Io(std::io::Error::other("disk full")))
            }
            fn latest(&self, _: i64, _: Mode, _: Option<&str>) -> Result<Option<SyncResult>> {
                Ok(None)
            }
            fn history(&self, _: i64, _: Option<Mode>, _: Option<&str>, _: usize) -> Result<Vec<SyncResult>> {
                Ok(Vec::new())
            }
        }

        let worker = |_: &WorkContext| Outcome::Success;
        let orch = Orchestrator::new(Arc::new(BrokenStore), Arc::new(worker));

        orch.queue(SyncRequest::new(1, Mode::Full)).unwrap();
        wait_idle(&orch);

        // And new work can be admitted
        orch.queue(SyncRequest::new(1, Mode::Pull)).unwrap();
        wait_idle(&orch);
    }

    #[test]
    fn test_build_result_mapping() {
        let task = Task::new(SyncRequest::new(4, Mode::Pull), 0.25);
        let started = task.started_at;

        let ok = build_result(&task, Outcome::Success, started + 10);
        assert!(ok.success && !ok.cancelled && ok.errors.is_empty());

        let cancelled = build_result(&task, Outcome::Cancelled, started + 10);
        assert!(!cancelled.success && cancelled.cancelled && cancelled.errors.is_empty());

        let failed = build_result(&task, Outcome::failed("a", "b"), started + 10);
        assert!(!failed.success && !failed.cancelled);
        assert_eq!(failed.errors.len(), 1);

        // Clock going backwards never yields ended_at < started_at
        let skewed = build_result(&task, Outcome::Success, started - 500);
        assert_eq!(skewed.ended_at, Some(started));
    }

    #[test]
    fn test_directory_not_consulted_while_slot_locked() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::OnceLock;

        #[derive(Default)]
        struct WatchingDirectory {
            orch: OnceLock<Orchestrator>,
            locked_calls: AtomicUsize,
        }

        impl AccountDirectory for WatchingDirectory {
            fn get(&self, id: i64) -> Option<Account> {
                if let Some(orch) = self.orch.get() {
                    if orch.shared.current.try_lock().is_none() {
                        self.locked_calls.fetch_add(1, Ordering::SeqCst);
                    }
                }
                Some(Account::new(id, format!("user{id}")))
            }
        }

        let directory = Arc::new(WatchingDirectory::default());
        let (worker, release) = gated_worker();
        let orch = Orchestrator::with_parts(
            Arc::new(MemoryStore::new()),
            worker,
            directory.clone(),
            OrchestratorSettings::default(),
        );
        assert!(directory.orch.set(orch.clone()).is_ok());

        let task = orch.queue(SyncRequest::new(1, Mode::Full)).unwrap();
        assert_eq!(task.account_name(), "user1");

        let err = orch.queue(SyncRequest::new(2, Mode::Pull)).unwrap_err();
        assert_eq!(err.kind, QueueErrorKind::OtherAccount);
        assert!(err.message.contains("user1"), "{}", err.message);
        assert_eq!(directory.locked_calls.load(Ordering::SeqCst), 0);

        release.send(Outcome::Success).unwrap();
        wait_idle(&orch);
    }
}
