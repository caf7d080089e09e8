use std::time::Duration;

use thiserror::Error;

/// Failure raised by a work unit itself, as opposed to the machinery
/// waiting on it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkError {
    /// Deliberate failure injected for subjects carrying the failure marker.
    #[error("simulated failure for subject {0}")]
    Simulated(String),
    /// The worker running the unit died before producing a result
    /// (panicked task, exited thread).
    #[error("worker terminated abnormally: {0}")]
    Abnormal(String),
}

/// Everything that can go wrong between dispatching a workflow and
/// consuming its result.
///
/// Each variant maps to exactly one [`OutcomeStatus`](crate::OutcomeStatus):
/// `Interrupted` becomes `Cancelled`, `Timeout` becomes `Timeout`, and the
/// rest become `Failed`. A timeout is a distinct variant rather than a
/// wrapped work error so callers branch on the kind of result instead of
/// unpicking a cause chain — "I gave up waiting" is not "the work failed".
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The waiting side was asked to stop before the task resolved.
    #[error("wait interrupted: {0}")]
    Interrupted(String),
    /// The underlying work unit failed; the original cause is retained.
    #[error("work unit failed")]
    Execution(#[from] WorkError),
    /// A caller-supplied deadline elapsed before resolution.
    #[error("deadline of {0:?} elapsed before completion")]
    Timeout(Duration),
    /// The worker pool is no longer accepting work.
    #[error("worker pool rejected task: {0}")]
    PoolClosed(&'static str),
    /// The pool could not drain within its grace period even after forced
    /// termination. Logged at the highest severity but never a panic.
    #[error("worker pool failed to drain within {0:?}")]
    ShutdownStalled(Duration),
}
