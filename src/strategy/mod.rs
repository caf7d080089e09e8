//! Strategies — one concurrency execution model per implementation.
//!
//! The `Strategy` trait is the seam of the crate: every variant schedules
//! the same two work units (notify, reward) for a subject and resolves them
//! into exactly one [`ExecutionOutcome`], but each controls scheduling its
//! own way — inline, on raw threads, through a bounded pool with blocking
//! handles, through deferred-result combinators, or through a shared pool
//! it does not own.
//!
//! The harness only speaks this trait. Failures never escape it: every
//! error path a strategy can hit resolves to one of the four outcome
//! statuses, and a batch with failures still yields one outcome per
//! subject.

pub mod deferred;
pub mod managed;
pub mod pooled;
pub mod sequential;
pub mod threaded;

pub use deferred::DeferredStrategy;
pub use managed::ManagedStrategy;
pub use pooled::PooledStrategy;
pub use sequential::SequentialStrategy;
pub use threaded::ThreadedStrategy;

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::config::HarnessConfig;
use crate::error::StrategyError;
use crate::outcome::ExecutionOutcome;
use crate::work::{Subject, WorkRequest};

/// One concurrency execution model for a subject's two work units.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable name used in outcomes, subjects, and reports.
    fn name(&self) -> &'static str;

    /// Run one subject's notify/reward workflow to a terminal outcome.
    async fn register(&self, subject: &Subject) -> ExecutionOutcome;

    /// Run a batch of independent subjects. Subjects have no ordering
    /// guarantee, so the default drives them concurrently; strategies with
    /// no concurrency at all override this.
    async fn run_batch(&self, subjects: &[Subject]) -> Vec<ExecutionOutcome> {
        join_all(subjects.iter().map(|subject| self.register(subject))).await
    }

    /// Release resources owned by the strategy instance. Default is a
    /// no-op; pool-owning strategies drain then force-terminate.
    async fn shutdown(&self, _grace: Duration) -> Result<(), StrategyError> {
        Ok(())
    }
}

/// The delays applied to every subject's two work units — the single
/// dispatch helper all strategies build their requests through.
#[derive(Clone, Copy, Debug)]
pub struct Workload {
    pub notify_delay: Duration,
    pub reward_delay: Duration,
}

impl Workload {
    pub fn new(notify_delay: Duration, reward_delay: Duration) -> Self {
        Self {
            notify_delay,
            reward_delay,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.notify_delay, config.reward_delay)
    }

    /// Build the subject's pair of immutable requests, consumed once each.
    pub fn requests(&self, subject: &Subject) -> (WorkRequest, WorkRequest) {
        (
            WorkRequest::notify(subject, self.notify_delay),
            WorkRequest::reward(subject, self.reward_delay),
        )
    }
}

/// Notify-then-reward on one worker, the shape used by every variant that
/// dispatches the whole workflow as a single pooled task. Marked subjects
/// fail before any work runs.
pub(crate) async fn workflow_task(
    notify: WorkRequest,
    reward: WorkRequest,
) -> Result<String, StrategyError> {
    notify.fail_if_marked()?;
    let first = crate::work::perform(&notify).await;
    let second = crate::work::perform(&reward).await;
    Ok(format!("{first}; {second}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_builds_both_requests_for_a_subject() {
        let workload = Workload::new(Duration::from_millis(20), Duration::from_millis(10));
        let subject = Subject::numbered("batch", 0);
        let (notify, reward) = workload.requests(&subject);
        assert_eq!(notify.subject_id, "batch-0");
        assert_eq!(notify.payload, "batch-0@example.com");
        assert_eq!(notify.simulated_delay, Duration::from_millis(20));
        assert_eq!(reward.payload, "batch-0");
        assert_eq!(reward.simulated_delay, Duration::from_millis(10));
    }
}
