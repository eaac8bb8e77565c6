//! SQLite storage implementation.
//!
//! Sync results are append-only. A result row and its error rows are written
//! in one IMMEDIATE transaction so readers never see a result without its errors.

use crate::error::{Error, Result};
use crate::model::{DataScope, ErrorEntry, MediaScope, Mode, SyncResult};
use crate::storage::schema::apply_schema;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

const RESULT_COLUMNS: &str = "id, account_id, mode, data_scope, media_scope, target, \
                              started_at, ended_at, success, cancelled";

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Run `f` inside an IMMEDIATE transaction, committing on success.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let result = f(&tx)?;
        tx.commit()?;

        debug!(op, "Committed");
        Ok(result)
    }

    // ==================
    // Result Operations
    // ==================

    /// Append a finished run and its errors. Returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `ended_at` is missing, or a database error.
    pub fn record_result(&mut self, result: &SyncResult) -> Result<i64> {
        let ended_at = result.ended_at.ok_or_else(|| {
            Error::InvalidArgument("cannot record a sync result without ended_at".to_string())
        })?;

        self.mutate("record_result", |tx| {
            tx.execute(
                "INSERT INTO sync_results
                    (account_id, mode, data_scope, media_scope, target, started_at, ended_at, success, cancelled)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    result.account_id,
                    result.mode,
                    result.data,
                    result.media,
                    result.target,
                    result.started_at,
                    ended_at,
                    result.success,
                    result.cancelled,
                ],
            )?;
            let id = tx.last_insert_rowid();

            let mut stmt = tx.prepare(
                "INSERT INTO sync_result_errors (result_id, position, summary, detail)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, entry) in result.errors.iter().enumerate() {
                stmt.execute(rusqlite::params![id, position as i64, entry.summary, entry.detail])?;
            }

            Ok(id)
        })
    }

    /// Most recently ended result for `(account, mode, target)`.
    ///
    /// A `None` target matches only results recorded without a target.
    /// Ties on `ended_at` go to the later insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn latest_result(
        &self,
        account_id: i64,
        mode: Mode,
        target: Option<&str>,
    ) -> Result<Option<SyncResult>> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM sync_results
             WHERE account_id = ?1 AND mode = ?2 AND target IS ?3
             ORDER BY ended_at DESC, id DESC LIMIT 1"
        );

        let result = self
            .conn
            .query_row(&sql, rusqlite::params![account_id, mode, target], map_result_row)
            .optional()?;

        match result {
            Some(mut result) => {
                result.errors = self.result_errors(result.id)?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Results for an account, newest first.
    ///
    /// `mode` and `target` narrow the listing when given; a `None` target
    /// here means "any target".
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_results(
        &self,
        account_id: i64,
        mode: Option<Mode>,
        target: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SyncResult>> {
        let mut conditions = vec!["account_id = ?1".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(account_id)];

        if let Some(mode) = mode {
            params.push(Box::new(mode));
            conditions.push(format!("mode = ?{}", params.len()));
        }
        if let Some(target) = target {
            params.push(Box::new(target.to_string()));
            conditions.push(format!("target = ?{}", params.len()));
        }
        params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM sync_results
             WHERE {}
             ORDER BY ended_at DESC, id DESC LIMIT ?{}",
            conditions.join(" AND "),
            params.len()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params.iter().map(|p| &**p).collect();
        let rows = stmt.query_map(params_refs.as_slice(), map_result_row)?;

        let mut results = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        for result in &mut results {
            result.errors = self.result_errors(result.id)?;
        }
        Ok(results)
    }

    /// Errors of one result in recording order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn result_errors(&self, result_id: i64) -> Result<Vec<ErrorEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT summary, detail FROM sync_result_errors
             WHERE result_id = ?1 ORDER BY position",
        )?;

        let rows = stmt.query_map([result_id], |row| {
            Ok(ErrorEntry {
                summary: row.get(0)?,
                detail: row.get(1)?,
            })
        })?;

        let errors = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(errors)
    }

    /// Number of recorded results for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_results(&self, account_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sync_results WHERE account_id = ?1",
            [account_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn map_result_row(row: &rusqlite::Row) -> rusqlite::Result<SyncResult> {
    Ok(SyncResult {
        id: row.get(0)?,
        account_id: row.get(1)?,
        mode: row.get(2)?,
        data: row.get(3)?,
        media: row.get(4)?,
        target: row.get(5)?,
        started_at: row.get(6)?,
        ended_at: row.get(7)?,
        success: row.get(8)?,
        cancelled: row.get(9)?,
        errors: Vec::new(),
    })
}

// Enums are stored by their `as_str` names.
macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_text_enum!(Mode);
sql_text_enum!(DataScope);
sql_text_enum!(MediaScope);

#[cfg(test)]
mod tests {
    use super::*;

    fn result(account_id: i64, mode: Mode, target: Option<&str>, ended_at: i64) -> SyncResult {
        SyncResult {
            id: 0,
            account_id,
            mode,
            data: DataScope::All,
            media: MediaScope::All,
            target: target.map(String::from),
            started_at: Some(ended_at - 1_000),
            ended_at: Some(ended_at),
            success: true,
            cancelled: false,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_open_memory() {
        let storage = SqliteStorage::open_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_record_and_latest() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let mut failed = result(1, Mode::Full, None, 10_000);
        failed.success = false;
        failed.errors = vec![
            ErrorEntry::new("first", "detail one"),
            ErrorEntry::new("second", "detail two"),
        ];
        let id = storage.record_result(&failed).unwrap();
        assert!(id > 0);

        let latest = storage.latest_result(1, Mode::Full, None).unwrap().unwrap();
        assert_eq!(latest.id, id);
        assert!(!latest.success);
        assert_eq!(latest.errors.len(), 2);
        assert_eq!(latest.errors[0].summary, "first");
        assert_eq!(latest.errors[1].detail, "detail two");
    }

    #[test]
    fn test_latest_prefers_newest_end() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.record_result(&result(1, Mode::Pull, None, 5_000)).unwrap();
        let newer = storage.record_result(&result(1, Mode::Pull, None, 9_000)).unwrap();
        // Inserted later but ended earlier
        storage.record_result(&result(1, Mode::Pull, None, 7_000)).unwrap();

        let latest = storage.latest_result(1, Mode::Pull, None).unwrap().unwrap();
        assert_eq!(latest.id, newer);
        assert_eq!(latest.ended_at, Some(9_000));
    }

    #[test]
    fn test_latest_tie_goes_to_later_insert() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.record_result(&result(1, Mode::Pull, None, 5_000)).unwrap();
        let second = storage.record_result(&result(1, Mode::Pull, None, 5_000)).unwrap();

        let latest = storage.latest_result(1, Mode::Pull, None).unwrap().unwrap();
        assert_eq!(latest.id, second);
    }

    #[test]
    fn test_target_scoping() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let whole = storage.record_result(&result(2, Mode::Push, None, 1_000)).unwrap();
        let section = storage
            .record_result(&result(2, Mode::Push, Some("show-section"), 2_000))
            .unwrap();

        let untargeted = storage.latest_result(2, Mode::Push, None).unwrap().unwrap();
        assert_eq!(untargeted.id, whole);

        let targeted = storage
            .latest_result(2, Mode::Push, Some("show-section"))
            .unwrap()
            .unwrap();
        assert_eq!(targeted.id, section);

        assert!(storage.latest_result(2, Mode::Push, Some("movies")).unwrap().is_none());
    }

    #[test]
    fn test_latest_none_when_never_run() {
        let storage = SqliteStorage::open_memory().unwrap();
        assert!(storage.latest_result(3, Mode::FastPull, None).unwrap().is_none());
    }

    #[test]
    fn test_record_requires_ended_at() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut open = result(1, Mode::Full, None, 1_000);
        open.ended_at = None;
        assert!(matches!(
            storage.record_result(&open),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(storage.count_results(1).unwrap(), 0);
    }

    #[test]
    fn test_list_results_filters() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.record_result(&result(1, Mode::Full, None, 1_000)).unwrap();
        storage.record_result(&result(1, Mode::Push, Some("1"), 2_000)).unwrap();
        storage.record_result(&result(1, Mode::Push, Some("2"), 3_000)).unwrap();
        storage.record_result(&result(2, Mode::Full, None, 4_000)).unwrap();

        let all = storage.list_results(1, None, None, 10).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].ended_at, Some(3_000));

        let pushes = storage.list_results(1, Some(Mode::Push), None, 10).unwrap();
        assert_eq!(pushes.len(), 2);

        let one = storage.list_results(1, Some(Mode::Push), Some("1"), 10).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].target.as_deref(), Some("1"));

        let limited = storage.list_results(1, None, None, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_on_disk_persistence() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.record_result(&result(1, Mode::Full, None, 1_000)).unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert!(storage.latest_result(1, Mode::Full, None).unwrap().is_some());
    }
}
