//! Admission policy for new sync requests.
//!
//! Only one sync runs per process. When something is already running the
//! policy never admits; it only decides which rejection to report. Checks
//! run in this order:
//!
//! 1. a different account is running -> `OtherAccount`
//! 2. same account, mode and target -> `Duplicate`
//! 3. the running mode ranks at or above the requested one -> `Superseded`
//! 4. otherwise -> `Busy` (there is no backlog and no preemption)

use serde::{Deserialize, Serialize};

use crate::model::{Mode, SyncRequest};

use super::types::{QueueError, QueueErrorKind};

/// Rank of each mode. Higher ranks cover lower ones.
///
/// Ranks form a total preorder; equal ranks are allowed (Pull and Push by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModePrecedence {
    pub full: u8,
    pub pull: u8,
    pub fast_pull: u8,
    pub push: u8,
}

impl Default for ModePrecedence {
    fn default() -> Self {
        Self {
            full: 3,
            pull: 2,
            fast_pull: 1,
            push: 2,
        }
    }
}

impl ModePrecedence {
    #[must_use]
    pub const fn rank(&self, mode: Mode) -> u8 {
        match mode {
            Mode::Full => self.full,
            Mode::Pull => self.pull,
            Mode::FastPull => self.fast_pull,
            Mode::Push => self.push,
        }
    }
}

/// What the policy needs to know about the running task.
#[derive(Debug, Clone, Copy)]
pub struct ActiveRun<'a> {
    pub request: &'a SyncRequest,
    /// Display name of the running account.
    pub account_name: &'a str,
}

/// Reject requests that are malformed regardless of state.
pub fn validate(request: &SyncRequest) -> Result<(), QueueError> {
    if request.target.is_some() && !request.mode.accepts_target() {
        return Err(QueueError::new(
            QueueErrorKind::InvalidRequest,
            "Invalid Request",
            format!(
                "{} runs cannot be limited to a library section",
                request.mode.title()
            ),
        ));
    }

    if request.target.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(QueueError::new(
            QueueErrorKind::InvalidRequest,
            "Invalid Request",
            "Section target must not be empty",
        ));
    }

    Ok(())
}

/// Decide whether `request` may start given the `active` run, if any.
pub fn admit(
    precedence: &ModePrecedence,
    active: Option<ActiveRun<'_>>,
    request: &SyncRequest,
) -> Result<(), QueueError> {
    validate(request)?;

    let Some(active) = active else {
        return Ok(());
    };
    let running = active.request;
    let running_title = describe(running);

    if running.account_id != request.account_id {
        return Err(QueueError::new(
            QueueErrorKind::OtherAccount,
            "Sync In Progress",
            format!(
                "{running_title} is already running for \"{}\", only one sync can run at a time",
                active.account_name
            ),
        ));
    }

    if running.key() == request.key() {
        return Err(QueueError::new(
            QueueErrorKind::Duplicate,
            "Already Running",
            format!("{running_title} is already running"),
        ));
    }

    if precedence.rank(running.mode) >= precedence.rank(request.mode) {
        return Err(QueueError::new(
            QueueErrorKind::Superseded,
            "Sync In Progress",
            format!(
                "{running_title} is already running, {} has not been started",
                describe(request)
            ),
        ));
    }

    Err(QueueError::new(
        QueueErrorKind::Busy,
        "Sync Busy",
        format!(
            "{running_title} is running, wait for it to finish before starting {}",
            describe(request)
        ),
    ))
}

/// `Push "<target>"` for targeted pushes, the mode title otherwise.
fn describe(request: &SyncRequest) -> String {
    match request.target.as_deref() {
        Some(target) => format!("{} \"{target}\"", request.mode.title()),
        None => request.mode.title().to_string(),
    }
}
