//! In-process result store.
//!
//! Append-only vector behind a read-write lock; readers get clones. Used when
//! history does not need to outlive the process, and in tests.

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::model::{Mode, SyncResult};

use super::ResultStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    results: RwLock<Vec<SyncResult>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

impl ResultStore for MemoryStore {
    fn record(&self, result: &SyncResult) -> Result<i64> {
        if result.ended_at.is_none() {
            return Err(Error::InvalidArgument(
                "cannot record a sync result without ended_at".to_string(),
            ));
        }

        let mut results = self.results.write();
        let id = i64::try_from(results.len()).unwrap_or(i64::MAX - 1) + 1;
        let mut stored = result.clone();
        stored.id = id;
        results.push(stored);
        Ok(id)
    }

    fn latest(&self, account_id: i64, mode: Mode, target: Option<&str>) -> Result<Option<SyncResult>> {
        let results = self.results.read();
        // max_by_key keeps the last of equal keys, so ties go to the later insert
        Ok(results
            .iter()
            .filter(|r| {
                r.account_id == account_id && r.mode == mode && r.target.as_deref() == target
            })
            .max_by_key(|r| r.ended_at)
            .cloned())
    }

    fn history(
        &self,
        account_id: i64,
        mode: Option<Mode>,
        target: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SyncResult>> {
        let results = self.results.read();
        let mut matching: Vec<SyncResult> = results
            .iter()
            .filter(|r| r.account_id == account_id)
            .filter(|r| mode.is_none_or(|m| r.mode == m))
            .filter(|r| target.is_none_or(|t| r.target.as_deref() == Some(t)))
            .cloned()
            .collect();

        // Stable sort on reversed insertion order keeps later inserts first on ties
        matching.reverse();
        matching.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
        matching.truncate(limit);
        Ok(matching)
    }
}
