//! Result store for MediaSync.
//!
//! Finished sync runs are persisted one record per run and are never
//! modified afterwards. The orchestrator is the only writer; any number of
//! status readers may query concurrently.
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - SQLite storage implementation
//! - [`memory`] - In-process store for ephemeral history and tests

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStorage;

use parking_lot::Mutex;

use crate::error::Result;
use crate::model::{Mode, SyncResult};

/// Append-only, queryable log of finished runs.
pub trait ResultStore: Send + Sync {
    /// Append a result. Fails on storage errors or a missing `ended_at`.
    fn record(&self, result: &SyncResult) -> Result<i64>;

    /// Most recent result for `(account, mode, target)` by `ended_at`.
    ///
    /// `target = None` matches only results recorded without a target.
    fn latest(&self, account_id: i64, mode: Mode, target: Option<&str>) -> Result<Option<SyncResult>>;

    /// Results for an account, newest first, optionally narrowed by mode
    /// and target (`None` meaning any).
    fn history(
        &self,
        account_id: i64,
        mode: Option<Mode>,
        target: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SyncResult>>;
}

/// [`SqliteStorage`] behind a mutex so it can be shared across threads.
#[derive(Debug)]
pub struct SharedStorage(Mutex<SqliteStorage>);

impl SharedStorage {
    #[must_use]
    pub fn new(storage: SqliteStorage) -> Self {
        Self(Mutex::new(storage))
    }
}

impl ResultStore for SharedStorage {
    fn record(&self, result: &SyncResult) -> Result<i64> {
        self.0.lock().record_result(result)
    }

    fn latest(&self, account_id: i64, mode: Mode, target: Option<&str>) -> Result<Option<SyncResult>> {
        self.0.lock().latest_result(account_id, mode, target)
    }

    fn history(
        &self,
        account_id: i64,
        mode: Option<Mode>,
        target: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SyncResult>> {
        self.0.lock().list_results(account_id, mode, target, limit)
    }
}
