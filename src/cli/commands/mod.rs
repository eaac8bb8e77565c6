//! Command implementations.

pub mod completions;
pub mod history;
pub mod init;
pub mod run;
pub mod status;
pub mod version;

use std::path::Path;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;

/// Open the history database, which must already exist.
pub(crate) fn open_storage(db_path: Option<&Path>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    SqliteStorage::open(&db_path)
}
