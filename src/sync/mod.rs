//! Sync task orchestration.
//!
//! This module runs at most one sync operation per process and keeps the
//! history of finished runs:
//!
//! - **Admission**: decides whether a request may start given the active run
//! - **Orchestrator**: owns the active-task slot and the worker thread
//! - **Progress**: percent complete and remaining-time estimate
//! - **Status**: human-readable summaries of recorded results
//!
//! # Lifecycle
//!
//! 1. `queue()` validates the request against the active task, then
//!    publishes a new [`Task`] as `current` and starts the worker
//! 2. The worker reports progress and polls the cancel flag at checkpoints
//! 3. On any outcome the result is recorded, then `current` is cleared
//!
//! # Example
//!
//! ```ignore
//! use msync::model::{Mode, SyncRequest};
//! use msync::storage::MemoryStore;
//! use msync::sync::{Orchestrator, SimulatedWorker};
//!
//! let orch = Orchestrator::new(Arc::new(MemoryStore::new()), Arc::new(SimulatedWorker::default()));
//! let task = orch.queue(SyncRequest::new(1, Mode::Pull))?;
//! println!("{}", task.title(None));
//! ```

pub mod admission;
mod orchestrator;
mod progress;
mod simulate;
pub mod status;
mod task;
mod types;
mod worker;

pub use admission::ModePrecedence;
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use progress::{DEFAULT_SMOOTHING, Progress, ProgressSnapshot};
pub use simulate::SimulatedWorker;
pub use status::{NOT_RUN, Overview, StatusRow, human_duration, overview, summarize};
pub use task::{CancelFlag, Task, TaskView};
pub use types::{QueueError, QueueErrorKind};
pub use worker::{Cancelled, Outcome, SyncWorker, WorkContext};
