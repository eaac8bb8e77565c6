//! Run command implementation.
//!
//! Queues a sync against the simulated worker and follows it to the end,
//! the same way a menu layer would: by polling `current()` and rendering
//! the task title and summary.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::model::{DataScope, MediaScope, Mode, SyncRequest, SyncResult};
use crate::storage::SharedStorage;
use crate::sync::{Orchestrator, SimulatedWorker, TaskView, summarize};
use colored::Colorize;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use super::open_storage;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Serialize)]
struct RunOutput {
    task: TaskView,
    result: Option<SyncResult>,
    status: String,
}

/// Execute run command.
///
/// # Errors
///
/// Returns an error if arguments are invalid, the account is unknown, the
/// database is missing, or the request is rejected.
pub fn execute(
    args: &RunArgs,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let mode: Mode = args.mode.parse()?;
    let data: DataScope = args.data.parse()?;
    let media: MediaScope = args.media.parse()?;

    let config = Config::resolve(config_path)?;
    let account = config.account(args.account)?;
    let store = Arc::new(SharedStorage::new(open_storage(db_path)?));
    let worker = SimulatedWorker::new(args.items, args.fail, Duration::from_millis(args.delay_ms));

    let orchestrator = Orchestrator::with_parts(
        store,
        Arc::new(worker),
        config.account_directory(),
        config.orchestrator_settings(),
    );

    let mut request = SyncRequest::new(account.id, mode).data(data).media(media);
    if let Some(target) = &args.target {
        request = request.target(target.clone());
    }

    let task = orchestrator.queue(request)?;
    let cancel_after = args.cancel_after_ms.map(Duration::from_millis);
    let live = !json && !quiet && std::io::stderr().is_terminal();
    let started = Instant::now();
    let mut last_line = String::new();

    while !orchestrator.is_idle() {
        if cancel_after.is_some_and(|after| started.elapsed() >= after) && !task.cancel_requested() {
            debug!(task_id = %task.id, "Cancel deadline reached");
            orchestrator.cancel();
        }

        if live {
            let line = format!("{} - {}", task.title(Some(&account.name)), task.summary());
            if line != last_line {
                eprint!("{}", live_frame(&line));
                last_line = line;
            }
        }

        thread::sleep(POLL_INTERVAL);
    }

    if live && !last_line.is_empty() {
        eprintln!();
    }

    let result = orchestrator.latest(account.id, mode, task.target())?;
    let status = summarize(result.as_ref(), chrono::Utc::now().timestamp_millis());

    if json {
        let output = RunOutput {
            task: task.view(),
            result,
            status,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
        return Ok(());
    }

    let title = task.title(Some(&account.name));
    let state = match result.as_ref().map(SyncResult::state_label) {
        Some("success") => "success".green(),
        Some("cancelled") => "cancelled".yellow(),
        Some(other) => other.red(),
        None => "unrecorded".red(),
    };
    println!("{} [{state}]", title.bold());
    println!("  {status}");

    if let Some(result) = &result {
        for error in result.errors() {
            println!("  - {}: {}", error.summary, error.detail.dimmed());
        }
    }

    Ok(())
}

/// Return to column zero and clear the line before redrawing it.
fn live_frame(line: &str) -> String {
    format!("\r\x1b[2K{line}")
}
