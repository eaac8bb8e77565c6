//! Status command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::storage::SharedStorage;
use crate::sync::{NOT_RUN, Overview, StatusRow, overview};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use super::open_storage;

#[derive(Serialize)]
struct StatusOutput {
    remote: String,
    accounts: Vec<Overview>,
}

/// Execute status command.
///
/// Shows one line per runnable action of each account (or only `account`).
///
/// # Errors
///
/// Returns an error if the database is missing, the account is unknown, or
/// a query fails.
pub fn execute(
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    account: Option<i64>,
    json: bool,
) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let store = SharedStorage::new(open_storage(db_path)?);
    let now = chrono::Utc::now().timestamp_millis();

    let accounts = match account {
        Some(id) => vec![config.account(id)?],
        None => config.listed_accounts(),
    };

    let overviews = accounts
        .iter()
        .map(|account| overview(&store, account, &config.sections, &config.remote, now))
        .collect::<Result<Vec<_>>>()?;

    if json {
        let output = StatusOutput {
            remote: config.remote,
            accounts: overviews,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
        return Ok(());
    }

    for (i, overview) in overviews.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!(
            "{} {}",
            overview.account.name.blue().bold(),
            format!("(#{})", overview.account.id).dimmed()
        );
        for row in &overview.rows {
            print_row(row);
        }
    }

    Ok(())
}

fn print_row(row: &StatusRow) {
    let summary = if row.summary == NOT_RUN {
        row.summary.dimmed()
    } else if row.summary.ends_with("was successful.") {
        row.summary.green()
    } else {
        row.summary.red()
    };
    println!("  {:<32} {summary}", row.title);
}
