//! Pooled strategy: a bounded worker pool owned by the instance, with
//! blocking result handles. Submitting is non-blocking; resolving a handle
//! blocks until done, optionally bounded by a caller-supplied timeout that
//! cancels the outstanding work on expiry.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::error::StrategyError;
use crate::outcome::ExecutionOutcome;
use crate::pool::{TaskHandle, WorkerPool};
use crate::work::{self, Subject, WorkRequest};

use super::{Strategy, Workload, workflow_task};

pub struct PooledStrategy {
    workload: Workload,
    pool: WorkerPool,
}

impl PooledStrategy {
    pub fn new(workload: Workload, capacity: usize) -> Self {
        Self {
            workload,
            pool: WorkerPool::new("pooled", capacity),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    fn submit_unit(&self, request: WorkRequest) -> Result<TaskHandle<String>, StrategyError> {
        self.pool.submit(async move {
            request.fail_if_marked()?;
            Ok(work::perform(&request).await)
        })
    }

    fn dispatch_pair(
        &self,
        subject: &Subject,
    ) -> Result<(TaskHandle<String>, TaskHandle<String>), StrategyError> {
        let (notify, reward) = self.workload.requests(subject);
        Ok((self.submit_unit(notify)?, self.submit_unit(reward)?))
    }

    /// Bounded-wait variant: each handle gets up to `limit`. Expiry cancels
    /// whatever is still outstanding and records a Timeout outcome; a work
    /// unit failure stays a Failed outcome with its cause.
    pub async fn register_with_timeout(
        &self,
        subject: &Subject,
        limit: Duration,
    ) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, ?limit, "pooled registration with timeout started");
        let (notify_handle, reward_handle) = match self.dispatch_pair(subject) {
            Ok(handles) => handles,
            Err(err) => {
                return ExecutionOutcome::from_error(self.name(), &subject.id, started, &err);
            }
        };

        let first = match notify_handle.wait_timeout(limit).await {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(subject = %subject.id, %err, "notify wait gave up; cancelling reward");
                reward_handle.cancel();
                return ExecutionOutcome::from_error(self.name(), &subject.id, started, &err);
            }
        };
        match reward_handle.wait_timeout(limit).await {
            Ok(second) => ExecutionOutcome::success(
                self.name(),
                &subject.id,
                started,
                format!("{first}; {second}"),
            ),
            Err(err) => ExecutionOutcome::from_error(self.name(), &subject.id, started, &err),
        }
    }

    /// Dispatch the whole workflow as one pooled task and hand the caller
    /// its handle to wait, poll, or cancel.
    pub fn submit_registration(
        &self,
        subject: &Subject,
    ) -> Result<TaskHandle<String>, StrategyError> {
        tracing::info!(subject = %subject.id, "pooled registration submitted");
        let (notify, reward) = self.workload.requests(subject);
        self.pool.submit(workflow_task(notify, reward))
    }
}

#[async_trait]
impl Strategy for PooledStrategy {
    fn name(&self) -> &'static str {
        "pooled"
    }

    async fn register(&self, subject: &Subject) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "pooled registration started");
        let (notify_handle, reward_handle) = match self.dispatch_pair(subject) {
            Ok(handles) => handles,
            Err(err) => {
                return ExecutionOutcome::from_error(self.name(), &subject.id, started, &err);
            }
        };

        // Unbounded wait on both; the first failure encountered wins.
        let (notify_res, reward_res) = tokio::join!(notify_handle.wait(), reward_handle.wait());
        match (notify_res, reward_res) {
            (Ok(first), Ok(second)) => ExecutionOutcome::success(
                self.name(),
                &subject.id,
                started,
                format!("{first}; {second}"),
            ),
            (Err(err), _) | (_, Err(err)) => {
                ExecutionOutcome::from_error(self.name(), &subject.id, started, &err)
            }
        }
    }

    async fn shutdown(&self, grace: Duration) -> Result<(), StrategyError> {
        self.pool.shutdown(grace).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OutcomeStatus;
    use std::time::Instant;

    fn strategy(d1: u64, d2: u64) -> PooledStrategy {
        PooledStrategy::new(
            Workload::new(Duration::from_millis(d1), Duration::from_millis(d2)),
            10,
        )
    }

    #[tokio::test]
    async fn units_run_concurrently_within_one_subject() {
        let strategy = strategy(60, 40);
        let subject = Subject::numbered("pooled", 0);

        let start = Instant::now();
        let outcome = strategy.register(&subject).await;
        let elapsed = start.elapsed();

        assert!(outcome.is_success());
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn timeout_is_reported_as_timeout_not_failure() {
        let strategy = strategy(200, 200);
        let subject = Subject::numbered("pooled", 1);
        let outcome = strategy
            .register_with_timeout(&subject, Duration::from_millis(30))
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Timeout);
    }

    #[tokio::test]
    async fn marked_subject_is_reported_as_failed_with_the_cause() {
        let strategy = strategy(10, 10);
        let subject = Subject::numbered("pooled-exception", 0);
        let outcome = strategy.register(&subject).await;
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert!(outcome.detail.contains("work unit failed"));
    }

    #[tokio::test]
    async fn submitted_registration_resolves_through_its_handle() {
        let strategy = strategy(10, 10);
        let subject = Subject::numbered("pooled", 2);
        let handle = strategy.submit_registration(&subject).expect("submit");
        let message = handle.wait().await.expect("workflow");
        assert_eq!(
            message,
            "welcome mail sent to pooled-2@example.com; welcome points accrued for pooled-2"
        );
    }

    #[tokio::test]
    async fn shutdown_releases_the_pool() {
        let strategy = strategy(5, 5);
        let subject = Subject::numbered("pooled", 3);
        strategy.register(&subject).await;
        strategy
            .shutdown(Duration::from_secs(1))
            .await
            .expect("shutdown");
        assert!(strategy.pool().is_closed());
    }
}
