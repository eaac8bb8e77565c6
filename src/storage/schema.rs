//! Database schema definitions.
//!
//! Timestamps are stored as INTEGER (Unix milliseconds).

use rusqlite::{Connection, Result};

/// Current schema version, stored in `PRAGMA user_version`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the MediaSync history database.
pub const SCHEMA_SQL: &str = r"
-- One row per finished sync run. Rows are never updated.
CREATE TABLE IF NOT EXISTS sync_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL,
    mode TEXT NOT NULL CHECK (mode IN ('full', 'pull', 'fast_pull', 'push')),
    data_scope TEXT NOT NULL DEFAULT 'all',
    media_scope TEXT NOT NULL DEFAULT 'all',
    target TEXT,
    started_at INTEGER,
    ended_at INTEGER NOT NULL,
    success INTEGER NOT NULL CHECK (success IN (0, 1)),
    cancelled INTEGER NOT NULL DEFAULT 0 CHECK (cancelled IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_sync_results_key
    ON sync_results(account_id, mode, target, ended_at DESC);
CREATE INDEX IF NOT EXISTS idx_sync_results_account_ended
    ON sync_results(account_id, ended_at DESC);

-- Item-level errors of a run, in recording order.
CREATE TABLE IF NOT EXISTS sync_result_errors (
    result_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    summary TEXT NOT NULL,
    detail TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (result_id, position),
    FOREIGN KEY (result_id) REFERENCES sync_results(id) ON DELETE CASCADE
);
";

/// Apply pragmas and the schema. Safe to call on every open.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    // Set pragmas before schema creation
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    Ok(())
}
