//! Deferred-result strategy: work units dispatched on the bounded pool and
//! composed with pure combinators — join, chain, deadline-with-fallback,
//! and recovery. Fan-in is concurrent even when the pieces are the same
//! ones chains are built from, because both tasks are already running on
//! the pool by the time a combinator waits on them.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::error::StrategyError;
use crate::outcome::ExecutionOutcome;
use crate::pool::{TaskHandle, WorkerPool};
use crate::work::{self, Subject, WorkRequest};

use super::{Strategy, Workload, workflow_task};

/// Wait for both handles and combine their values. The first failure
/// encountered short-circuits the combined result; recovery has to be
/// requested explicitly via [`recover`].
pub async fn join2<A, B>(
    first: TaskHandle<A>,
    second: TaskHandle<B>,
) -> Result<(A, B), StrategyError> {
    let (a, b) = tokio::join!(first.wait(), second.wait());
    Ok((a?, b?))
}

/// Sequence a second deferred computation after the first resolves
/// successfully, carrying the first value into it.
pub async fn chain<A, B, F>(first: TaskHandle<A>, then: F) -> Result<B, StrategyError>
where
    F: FnOnce(A) -> Result<TaskHandle<B>, StrategyError> + Send,
{
    let carried = first.wait().await?;
    then(carried)?.wait().await
}

/// Attach a deadline to a deferred computation. On expiry the fallback
/// value is substituted and no error is observable by the caller; the
/// underlying task is aborted so no worker stays blocked on abandoned work.
pub async fn with_deadline<T>(
    handle: TaskHandle<T>,
    deadline: Duration,
    fallback: T,
) -> Result<T, StrategyError> {
    match handle.wait_timeout(deadline).await {
        Err(StrategyError::Timeout(_)) => {
            tracing::warn!(?deadline, "deadline elapsed; substituting fallback value");
            Ok(fallback)
        }
        other => other,
    }
}

/// Intercept a failed deferred computation and substitute a recovery
/// value, turning the failed path into a successful one.
pub async fn recover<T, F>(handle: TaskHandle<T>, with: F) -> T
where
    F: FnOnce(&StrategyError) -> T + Send,
{
    match handle.wait().await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, "deferred computation failed; substituting recovery value");
            with(&err)
        }
    }
}

pub struct DeferredStrategy {
    workload: Workload,
    pool: WorkerPool,
}

impl DeferredStrategy {
    pub fn new(workload: Workload, capacity: usize) -> Self {
        Self {
            workload,
            pool: WorkerPool::new("deferred", capacity),
        }
    }

    fn submit_unit(&self, request: WorkRequest) -> Result<TaskHandle<String>, StrategyError> {
        self.pool.submit(async move {
            request.fail_if_marked()?;
            Ok(work::perform(&request).await)
        })
    }

    /// Chained variant: reward starts only after notify resolved, with the
    /// notify result carried forward into the combined message.
    pub async fn register_chained(&self, subject: &Subject) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "deferred chained registration started");
        let (notify, reward) = self.workload.requests(subject);

        let chained = async {
            let first = self.submit_unit(notify)?;
            chain(first, |carried: String| {
                self.pool.submit(async move {
                    let second = work::perform(&reward).await;
                    Ok(format!("{carried}; {second}"))
                })
            })
            .await
        };
        match chained.await {
            Ok(message) => ExecutionOutcome::success(self.name(), &subject.id, started, message),
            Err(err) => ExecutionOutcome::from_error(self.name(), &subject.id, started, &err),
        }
    }

    /// Deadline variant: the whole workflow runs as one deferred task; on
    /// expiry the caller sees the configured fallback instead of an error.
    pub async fn register_with_deadline(
        &self,
        subject: &Subject,
        deadline: Duration,
        fallback: &str,
    ) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, ?deadline, "deferred registration with deadline started");
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

    /// Recovery variant: a failed workflow resolves to the configured
    /// recovery message as a Success outcome instead of a Failed one.
    pub async fn register_with_recovery(
        &self,
        subject: &Subject,
        recovery: &str,
    ) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "deferred registration with recovery started");
        let (notify, reward) = self.workload.requests(subject);

        let message = match self.pool.submit(workflow_task(notify, reward)) {
            Ok(handle) => recover(handle, |_| recovery.to_owned()).await,
            Err(err) => {
                return ExecutionOutcome::from_error(self.name(), &subject.id, started, &err);
            }
        };
        ExecutionOutcome::success(self.name(), &subject.id, started, message)
    }
}

#[async_trait]
impl Strategy for DeferredStrategy {
    fn name(&self) -> &'static str {
        "deferred"
    }

    async fn register(&self, subject: &Subject) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "deferred registration started");
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

    async fn shutdown(&self, grace: Duration) -> Result<(), StrategyError> {
        self.pool.shutdown(grace).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OutcomeStatus;
    use std::time::Instant;

    fn strategy(d1: u64, d2: u64) -> DeferredStrategy {
        DeferredStrategy::new(
            Workload::new(Duration::from_millis(d1), Duration::from_millis(d2)),
            10,
        )
    }

    #[tokio::test]
    async fn join_runs_both_units_concurrently() {
        let strategy = strategy(60, 40);
        let subject = Subject::numbered("deferred", 0);

        let start = Instant::now();
        let outcome = strategy.register(&subject).await;
        let elapsed = start.elapsed();

        assert!(outcome.is_success());
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn chain_starts_the_second_unit_after_the_first() {
        let strategy = strategy(40, 30);
        let subject = Subject::numbered("deferred", 1);

        let start = Instant::now();
        let outcome = strategy.register_chained(&subject).await;

        assert!(outcome.is_success());
        assert!(start.elapsed() >= Duration::from_millis(70));
        assert!(outcome.detail.starts_with("welcome mail sent to"));
    }

    #[tokio::test]
    async fn expired_deadline_yields_the_fallback_without_an_error() {
        let strategy = strategy(200, 200);
        let subject = Subject::numbered("deferred", 2);
        let outcome = strategy
            .register_with_deadline(&subject, Duration::from_millis(30), "deadline fallback")
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.detail, "deadline fallback");
    }

    #[tokio::test]
    async fn met_deadline_yields_the_real_result() {
        let strategy = strategy(10, 10);
        let subject = Subject::numbered("deferred", 3);
        let outcome = strategy
            .register_with_deadline(&subject, Duration::from_secs(2), "deadline fallback")
            .await;
        assert!(outcome.is_success());
        assert!(outcome.detail.starts_with("welcome mail sent to"));
    }

    #[tokio::test]
    async fn marked_subject_recovers_into_a_success() {
        let strategy = strategy(10, 10);
        let subject = Subject::numbered("deferred-exception", 0);
        let outcome = strategy
            .register_with_recovery(&subject, "registration recovered")
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.detail, "registration recovered");
    }

    #[tokio::test]
    async fn unmarked_subject_does_not_trigger_recovery() {
        let strategy = strategy(10, 10);
        let subject = Subject::numbered("deferred", 4);
        let outcome = strategy
            .register_with_recovery(&subject, "registration recovered")
            .await;
        assert!(outcome.is_success());
        assert_ne!(outcome.detail, "registration recovered");
    }
}
