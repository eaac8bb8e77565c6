//! Human-readable status lines built from recorded results.
//!
//! [`summarize`] turns the latest result for a key into a single sentence,
//! e.g. `"Last run 2 hours ago, taking 3 minutes, was successful."`.
//! [`overview`] collects one such line per runnable action of an account.

use serde::Serialize;

use crate::error::Result;
use crate::model::{Account, Mode, Section, SyncResult};
use crate::storage::ResultStore;

/// Status text for a key that has never finished a run.
pub const NOT_RUN: &str = "Not run yet.";

const UNITS: [(&str, i64); 5] = [
    ("year", 365 * 86_400),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// Summarize the latest result for a key.
#[must_use]
pub fn summarize(result: Option<&SyncResult>, now_ms: i64) -> String {
    let Some(result) = result else {
        return NOT_RUN.to_string();
    };

    let mut fragments = Vec::with_capacity(3);

    if let Some(ended_at) = result.ended_at {
        let since = now_ms - ended_at;
        if since < 1000 {
            fragments.push("Last run just a moment ago".to_string());
        } else {
            fragments.push(format!("Last run {} ago", human_duration(since)));
        }

        if let Some(started_at) = result.started_at {
            let elapsed = ended_at - started_at;
            if elapsed < 1000 {
                fragments.push("taking less than a second".to_string());
            } else {
                fragments.push(format!("taking {}", human_duration(elapsed)));
            }
        }
    }

    fragments.push(outcome_fragment(result));

    format!("{}.", fragments.join(", "))
}

fn outcome_fragment(result: &SyncResult) -> String {
    if result.success {
        return "was successful".to_string();
    }

    match result.errors.as_slice() {
        [] => "failed".to_string(),
        [only] => format!("failed ({})", only.summary),
        [first, ..] => format!("failed ({} errors, {})", result.errors.len(), first.summary),
    }
}

/// Render a millisecond duration with one unit of precision.
///
/// Truncates toward zero: 119 seconds is `"1 minute"`. Anything under a
/// second renders as `"0 seconds"`.
#[must_use]
pub fn human_duration(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;

    for (unit, size) in UNITS {
        if seconds >= size {
            let count = seconds / size;
            let plural = if count == 1 { "" } else { "s" };
            return format!("{count} {unit}{plural}");
        }
    }

    "0 seconds".to_string()
}

/// One runnable action of an account with its last-run status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub title: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub summary: String,
}

/// Status of every action available for one account.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub account: Account,
    pub rows: Vec<StatusRow>,
}

/// Whether a section can be pushed on its own.
fn is_pushable(section: &Section) -> bool {
    matches!(section.kind.as_str(), "movie" | "show")
}

/// Build the status overview for an account.
///
/// Push gets one row per movie/show section, plus a "Push all" row when
/// more than one section exists. With no sections there is no Push row.
///
/// # Errors
///
/// Returns an error if a store query fails.
pub fn overview(
    store: &dyn ResultStore,
    account: &Account,
    sections: &[Section],
    remote: &str,
    now_ms: i64,
) -> Result<Overview> {
    let mut actions: Vec<(String, Mode, Option<String>)> = vec![
        (Mode::Full.title().to_string(), Mode::Full, None),
        (format!("{} from {remote}", Mode::Pull.title()), Mode::Pull, None),
        (format!("{} from {remote}", Mode::FastPull.title()), Mode::FastPull, None),
    ];

    let pushable: Vec<&Section> = sections.iter().filter(|s| is_pushable(s)).collect();
    for section in &pushable {
        actions.push((
            format!("{} \"{}\" to {remote}", Mode::Push.title(), section.title),
            Mode::Push,
            Some(section.key.clone()),
        ));
    }
    if pushable.len() > 1 {
        actions.push((format!("{} all to {remote}", Mode::Push.title()), Mode::Push, None));
    }

    let mut rows = Vec::with_capacity(actions.len());
    for (title, mode, target) in actions {
        let latest = store.latest(account.id, mode, target.as_deref())?;
        rows.push(StatusRow {
            title,
            mode,
            target,
            summary: summarize(latest.as_ref(), now_ms),
        });
    }

    Ok(Overview {
        account: account.clone(),
        rows,
    })
}
