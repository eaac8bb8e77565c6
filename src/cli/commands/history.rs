//! History command implementation.

use crate::cli::HistoryArgs;
use crate::config::Config;
use crate::error::Result;
use crate::model::{Mode, SyncResult};
use crate::sync::human_duration;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use super::open_storage;

#[derive(Serialize)]
struct HistoryOutput {
    account_id: i64,
    /// All runs recorded for the account, before filtering.
    total: usize,
    count: usize,
    results: Vec<SyncResult>,
}

/// Execute history command.
///
/// # Errors
///
/// Returns an error if the mode is invalid, the account is unknown, the
/// database is missing, or the query fails.
pub fn execute(
    args: &HistoryArgs,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mode = args.mode.as_deref().map(str::parse::<Mode>).transpose()?;
    let config = Config::resolve(config_path)?;
    let account = config.account(args.account)?;
    let storage = open_storage(db_path)?;

    let results = storage.list_results(account.id, mode, args.target.as_deref(), args.limit)?;
    let total = storage.count_results(account.id)?;

    if json {
        let output = HistoryOutput {
            account_id: account.id,
            total,
            count: results.len(),
            results,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", format!("No runs recorded for {}.", account.name).dimmed());
        return Ok(());
    }

    println!(
        "{} {} {}",
        "History:".blue().bold(),
        account.name,
        format!("({} of {total})", results.len()).dimmed()
    );
    for result in &results {
        print_result(result);
    }

    Ok(())
}

fn print_result(result: &SyncResult) {
    let ended = result
        .ended_at
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let state = match result.state_label() {
        "success" => "success".green(),
        "cancelled" => "cancelled".yellow(),
        other => other.red(),
    };

    let mut line = format!("  #{:<5} {ended}  {:<9} ", result.id, result.mode.as_str());
    if let Some(target) = &result.target {
        line.push_str(&format!("[{target}] "));
    }
    print!("{line}{state}");
    if let Some(elapsed) = result.elapsed_ms() {
        print!("{}", format!("  ({})", human_duration(elapsed)).dimmed());
    }
    println!();

    for error in result.errors() {
        if error.detail.is_empty() {
            println!("      - {}", error.summary);
        } else {
            println!("      - {}: {}", error.summary, error.detail.dimmed());
        }
    }
}
