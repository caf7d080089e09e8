//! Work units — the simulated collaborators every strategy schedules.
//!
//! A work unit is a pure function of a duration: it suspends (or, in the
//! blocking flavor, parks the thread) for exactly the request's simulated
//! delay and returns a completion message. The real notification and reward
//! collaborators live behind this boundary and are out of scope; only their
//! duration contract is modeled. Cancellation is the caller's concern: an
//! aborted task simply drops the pending sleep.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WorkError;

/// Subjects whose id contains this marker make the failure-injecting
/// strategy variants raise a [`WorkError::Simulated`].
pub const FAILURE_MARKER: &str = "exception";

/// The (userID, contactAddress) pair one workflow runs for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub contact: String,
}

impl Subject {
    pub fn new(id: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            contact: contact.into(),
        }
    }

    /// Subject `{prefix}-{index}` with a derived contact address, as the
    /// harness names batch members.
    pub fn numbered(prefix: &str, index: usize) -> Self {
        let id = format!("{prefix}-{index}");
        let contact = format!("{id}@example.com");
        Self { id, contact }
    }
}

/// Which side effect a request stands in for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkKind {
    Notify,
    Reward,
}

/// One immutable unit of scheduled work, created per invocation and
/// consumed once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRequest {
    pub subject_id: String,
    pub payload: String,
    pub kind: WorkKind,
    pub simulated_delay: Duration,
}

impl WorkRequest {
    pub fn notify(subject: &Subject, delay: Duration) -> Self {
        Self {
            subject_id: subject.id.clone(),
            payload: subject.contact.clone(),
            kind: WorkKind::Notify,
            simulated_delay: delay,
        }
    }

    pub fn reward(subject: &Subject, delay: Duration) -> Self {
        Self {
            subject_id: subject.id.clone(),
            payload: subject.id.clone(),
            kind: WorkKind::Reward,
            simulated_delay: delay,
        }
    }

    /// Raise the injected failure for marked subjects.
    pub fn fail_if_marked(&self) -> Result<(), WorkError> {
        if self.subject_id.contains(FAILURE_MARKER) {
            Err(WorkError::Simulated(self.subject_id.clone()))
        } else {
            Ok(())
        }
    }

    fn completion_message(&self) -> String {
        match self.kind {
            WorkKind::Notify => format!("welcome mail sent to {}", self.payload),
            WorkKind::Reward => format!("welcome points accrued for {}", self.subject_id),
        }
    }
}

/// Run a work unit on the current task, suspending for its simulated delay.
pub async fn perform(request: &WorkRequest) -> String {
    tracing::info!(subject = %request.subject_id, kind = ?request.kind, "work unit started");
    tokio::time::sleep(request.simulated_delay).await;
    tracing::info!(subject = %request.subject_id, kind = ?request.kind, "work unit finished");
    request.completion_message()
}

/// Blocking flavor for strategies that run work on dedicated OS threads.
pub fn perform_blocking(request: &WorkRequest) -> String {
    tracing::info!(subject = %request.subject_id, kind = ?request.kind, "work unit started (blocking)");
    std::thread::sleep(request.simulated_delay);
    tracing::info!(subject = %request.subject_id, kind = ?request.kind, "work unit finished (blocking)");
    request.completion_message()
}
