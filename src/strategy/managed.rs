//! Managed-pool strategy: the same join/recovery shapes as the pooled and
//! deferred variants, but dispatched through a shared pool the strategy
//! does not own. The pool is injected at construction and its lifecycle —
//! including shutdown — belongs to the surrounding container, so this
//! strategy's `shutdown` leaves it running.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::error::StrategyError;
use crate::outcome::ExecutionOutcome;
use crate::pool::{TaskHandle, WorkerPool};
use crate::work::{self, Subject, WorkRequest};

use super::deferred::{join2, recover, with_deadline};
use super::{Strategy, Workload, workflow_task};

pub struct ManagedStrategy {
    workload: Workload,
    pool: Arc<WorkerPool>,
}

impl ManagedStrategy {
    pub fn new(workload: Workload, pool: Arc<WorkerPool>) -> Self {
        Self { workload, pool }
    }

    fn submit_unit(&self, request: WorkRequest) -> Result<TaskHandle<String>, StrategyError> {
        self.pool.submit(async move {
            request.fail_if_marked()?;
            Ok(work::perform(&request).await)
        })
    }

    /// Deadline variant over the shared pool; identical contract to the
    /// deferred strategy's.
    pub async fn register_with_deadline(
        &self,
        subject: &Subject,
        deadline: Duration,
        fallback: &str,
    ) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, ?deadline, "managed registration with deadline started");
        let (notify, reward) = self.workload.requests(subject);

        let resolved = match self.pool.submit(workflow_task(notify, reward)) {
            Ok(handle) => with_deadline(handle, deadline, fallback.to_owned()).await,
            Err(err) => Err(err),
        };
        match resolved {
            Ok(message) => ExecutionOutcome::success(self.name(), &subject.id, started, message),
            Err(err) => ExecutionOutcome::from_error(self.name(), &subject.id, started, &err),
        }
    }

    /// Recovery variant over the shared pool; identical contract to the
    /// deferred strategy's.
    pub async fn register_with_recovery(
        &self,
        subject: &Subject,
        recovery: &str,
    ) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "managed registration with recovery started");
        let (notify, reward) = self.workload.requests(subject);

        let message = match self.pool.submit(workflow_task(notify, reward)) {
            Ok(handle) => recover(handle, |_| recovery.to_owned()).await,
            Err(err) => {
                return ExecutionOutcome::from_error(self.name(), &subject.id, started, &err);
            }
        };
        ExecutionOutcome::success(self.name(), &subject.id, started, message)
    }

    /// Dispatch both units and return immediately: no handle, no
    /// caller-visible error channel. Failures are terminal to the task and
    /// surface only in the log.
    pub fn register_fire_and_forget(&self, subject: &Subject) {
        tracing::info!(subject = %subject.id, "managed fire-and-forget registration dispatched");
        let (notify, reward) = self.workload.requests(subject);
        for request in [notify, reward] {
            let subject_id = request.subject_id.clone();
            let submitted = self.pool.submit(async move {
                if let Err(err) = request.fail_if_marked() {
                    tracing::warn!(subject = %request.subject_id, %err, "fire-and-forget task failed");
                    return Ok(());
                }
                work::perform(&request).await;
                Ok(())
            });
            if let Err(err) = submitted {
                tracing::warn!(subject = %subject_id, %err, "fire-and-forget dispatch rejected");
            }
        }
    }
}

#[async_trait]
impl Strategy for ManagedStrategy {
    fn name(&self) -> &'static str {
        "managed"
    }

    async fn register(&self, subject: &Subject) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "managed registration started");
        let (notify, reward) = self.workload.requests(subject);

        let joined = async {
            let notify_handle = self.submit_unit(notify)?;
            let reward_handle = self.submit_unit(reward)?;
            join2(notify_handle, reward_handle).await
        };
        match joined.await {
            Ok((first, second)) => ExecutionOutcome::success(
                self.name(),
                &subject.id,
                started,
                format!("{first}; {second}"),
            ),
            Err(err) => ExecutionOutcome::from_error(self.name(), &subject.id, started, &err),
        }
    }

    async fn shutdown(&self, _grace: Duration) -> Result<(), StrategyError> {
        // Pool lifecycle belongs to whoever injected it.
        tracing::debug!("managed pool left running; lifecycle is externally owned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OutcomeStatus;
    use std::time::Instant;

    fn shared_pool() -> Arc<WorkerPool> {
        Arc::new(WorkerPool::new("managed", 10))
    }

    fn strategy(pool: Arc<WorkerPool>, d1: u64, d2: u64) -> ManagedStrategy {
        ManagedStrategy::new(
            Workload::new(Duration::from_millis(d1), Duration::from_millis(d2)),
            pool,
        )
    }

    #[tokio::test]
    async fn registers_through_the_shared_pool() {
        let pool = shared_pool();
        let strategy = strategy(Arc::clone(&pool), 50, 30);
        let subject = Subject::numbered("managed", 0);

        let start = Instant::now();
        let outcome = strategy.register(&subject).await;
        let elapsed = start.elapsed();

        assert!(outcome.is_success());
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(80));
    }

    #[tokio::test]
    async fn strategy_shutdown_leaves_the_shared_pool_open() {
        let pool = shared_pool();
        let strategy = strategy(Arc::clone(&pool), 5, 5);
        strategy
            .shutdown(Duration::from_secs(1))
            .await
            .expect("shutdown");
        assert!(!pool.is_closed());
    }

    #[tokio::test]
    async fn fire_and_forget_returns_immediately_and_drains_later() {
        let pool = shared_pool();
        let strategy = strategy(Arc::clone(&pool), 40, 40);
        let subject = Subject::numbered("managed", 1);

        let start = Instant::now();
        strategy.register_fire_and_forget(&subject);
        assert!(start.elapsed() < Duration::from_millis(20));
        assert!(pool.in_flight() > 0);

        // The container shutting the shared pool down still drains the
        // dispatched work gracefully.
        assert!(pool.shutdown(Duration::from_secs(2)).await.is_ok());
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn fire_and_forget_failure_is_invisible_to_the_caller() {
        let pool = shared_pool();
        let strategy = strategy(Arc::clone(&pool), 5, 5);
        let subject = Subject::numbered("managed-exception", 0);
        // No panic, no outcome; the failure only reaches the log.
        strategy.register_fire_and_forget(&subject);
        assert!(pool.shutdown(Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn expired_deadline_yields_the_fallback() {
        let pool = shared_pool();
        let strategy = strategy(Arc::clone(&pool), 200, 200);
        let subject = Subject::numbered("managed", 2);
        let outcome = strategy
            .register_with_deadline(&subject, Duration::from_millis(30), "managed fallback")
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.detail, "managed fallback");
    }

    #[tokio::test]
    async fn marked_subject_recovers_into_a_success() {
        let pool = shared_pool();
        let strategy = strategy(Arc::clone(&pool), 5, 5);
        let subject = Subject::numbered("managed-exception", 1);
        let outcome = strategy
            .register_with_recovery(&subject, "managed recovery")
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.detail, "managed recovery");
    }
}
