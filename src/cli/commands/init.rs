//! Initialize the MediaSync history database.
//!
//! Creates the database at the resolved path (see
//! [`resolve_db_path`](crate::config::resolve_db_path)) and writes a default
//! `config.json` next to it if none exists yet.

use crate::config::{Config, resolve_config_path, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PathBuf>,
    config_created: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&Path>, config_path: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path)
        .ok_or_else(|| Error::Config("Could not determine MediaSync directory".to_string()))?;

    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path: db_path });
        }
        remove_database(&db_path)?;
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Opening applies the schema
    SqliteStorage::open(&db_path)?;
    info!(path = %db_path.display(), "Created history database");

    let config_path = resolve_config_path(config_path);
    let mut config_created = false;
    if let Some(path) = &config_path {
        if !path.exists() {
            Config::default().save(path)?;
            config_created = true;
        }
    }

    if json {
        let output = InitOutput {
            database: db_path,
            config: config_path,
            config_created,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized MediaSync history database");
        println!("  Database: {}", db_path.display());
        if let Some(path) = &config_path {
            let note = if config_created { "created" } else { "existing" };
            println!("  Config:   {} ({note})", path.display());
        }
        println!();
        println!("Next: add your accounts to config.json, then run 'msync status'.");
    }

    Ok(())
}

/// Delete a database file and its WAL side files.
fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;

    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            fs::remove_file(side)?;
        }
    }
    Ok(())
}
