//! Bounded worker pool with future-like handles.
//!
//! The pool enforces a fixed concurrency limit with a semaphore: `submit`
//! spawns the task immediately and hands back a [`TaskHandle`], but the task
//! only starts its work once it holds a permit, so at most `capacity` units
//! run at a time. The pool is shared across all invocations of the strategy
//! instance that owns it and its capacity is fixed at construction.
//!
//! # Handles
//!
//! A [`TaskHandle`] is the caller's only view of a dispatched task. It
//! resolves exactly once, through [`wait`](TaskHandle::wait) or
//! [`wait_timeout`](TaskHandle::wait_timeout), and can be cancelled or
//! polled for completion without consuming it. Cancelling or timing out
//! aborts the underlying task, so an abandoned handle can never surface a
//! late success.
//!
//! # Shutdown
//!
//! [`shutdown`](WorkerPool::shutdown) is two-phase: stop accepting work,
//! wait up to a grace period for in-flight tasks to drain, then abort
//! whatever remains and wait one more bounded interval. It is idempotent —
//! every call after the pool has drained returns immediately — and it never
//! blocks the caller indefinitely.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};
use tokio::task::{AbortHandle, JoinHandle};

use crate::error::{StrategyError, WorkError};

/// Extra interval granted to aborted tasks before shutdown gives up.
const FORCED_TERMINATION_WAIT: Duration = Duration::from_secs(1);

/// How a shutdown resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shutdown {
    /// All in-flight work finished within the grace period.
    Drained,
    /// The grace period elapsed; remaining tasks were aborted.
    Forced,
}

/// Handle to a pending or completed pool task.
pub struct TaskHandle<T> {
    join: JoinHandle<Result<T, StrategyError>>,
    cancelled: Arc<AtomicBool>,
}

impl<T> TaskHandle<T> {
    /// Signal the task to stop. If it already finished, the completed
    /// result stands; otherwise the task is aborted and a later wait
    /// resolves to `Interrupted`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.join.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_done(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the task reaches a terminal state.
    pub async fn wait(self) -> Result<T, StrategyError> {
        match self.join.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(StrategyError::Interrupted(
                "task aborted before completion".into(),
            )),
            Err(err) => Err(StrategyError::Execution(WorkError::Abnormal(
                err.to_string(),
            ))),
        }
    }

    /// Block up to `limit`. On expiry the task is cancelled and the wait
    /// resolves to [`StrategyError::Timeout`] — distinct from a failure of
    /// the work itself.
    pub async fn wait_timeout(self, limit: Duration) -> Result<T, StrategyError> {
        let TaskHandle { mut join, cancelled } = self;
        match tokio::time::timeout(limit, &mut join).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) if err.is_cancelled() => Err(StrategyError::Interrupted(
                "task aborted before completion".into(),
            )),
            Ok(Err(err)) => Err(StrategyError::Execution(WorkError::Abnormal(
                err.to_string(),
            ))),
            Err(_) => {
                cancelled.store(true, Ordering::SeqCst);
                join.abort();
                Err(StrategyError::Timeout(limit))
            }
        }
    }
}

/// Decrements the in-flight count when a task finishes, completes
/// abnormally, or is aborted before running.
struct InflightGuard {
    inflight: Arc<AtomicUsize>,
    drain: Arc<Notify>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.inflight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drain.notify_waiters();
        }
    }
}

/// Fixed-capacity worker pool shared for the lifetime of its owner.
pub struct WorkerPool {
    name: &'static str,
    capacity: usize,
    permits: Arc<Semaphore>,
    closed: AtomicBool,
    inflight: Arc<AtomicUsize>,
    drain: Arc<Notify>,
    aborts: Mutex<Vec<AbortHandle>>,
}

impl WorkerPool {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            permits: Arc::new(Semaphore::new(capacity)),
            closed: AtomicBool::new(false),
            inflight: Arc::new(AtomicUsize::new(0)),
            drain: Arc::new(Notify::new()),
            aborts: Mutex::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Tasks dispatched but not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// Dispatch a task, returning its handle without blocking. The task
    /// waits for a worker permit before running, which is what bounds
    /// concurrency to `capacity`.
    pub fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, StrategyError>
    where
        F: Future<Output = Result<T, StrategyError>> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(StrategyError::PoolClosed("pool is shut down"));
        }

        self.inflight.fetch_add(1, Ordering::AcqRel);
        let guard = InflightGuard {
            inflight: Arc::clone(&self.inflight),
            drain: Arc::clone(&self.drain),
        };
        let permits = Arc::clone(&self.permits);
        let join = tokio::spawn(async move {
            let _guard = guard;
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| StrategyError::Interrupted("worker permits revoked".into()))?;
            task.await
        });

        let mut aborts = self.aborts.lock().unwrap_or_else(PoisonError::into_inner);
        aborts.retain(|handle| !handle.is_finished());
        aborts.push(join.abort_handle());

        Ok(TaskHandle {
            join,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Resolve once every in-flight task has dropped its guard.
    async fn drained(&self) {
        loop {
            let notified = self.drain.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Two-phase shutdown: graceful drain up to `grace`, then forced
    /// termination of whatever is left. Safe to call repeatedly.
    pub async fn shutdown(&self, grace: Duration) -> Result<Shutdown, StrategyError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(pool = self.name, "pool shutdown requested");
        }

        if tokio::time::timeout(grace, self.drained()).await.is_ok() {
            tracing::info!(pool = self.name, "pool drained");
            return Ok(Shutdown::Drained);
        }

        tracing::warn!(
            pool = self.name,
            ?grace,
            in_flight = self.in_flight(),
            "grace period elapsed with work in flight; forcing termination"
        );
        let pending: Vec<AbortHandle> = {
            let mut aborts = self.aborts.lock().unwrap_or_else(PoisonError::into_inner);
            aborts.drain(..).collect()
        };
        for handle in pending {
            handle.abort();
        }

        match tokio::time::timeout(FORCED_TERMINATION_WAIT, self.drained()).await {
            Ok(()) => Ok(Shutdown::Forced),
            Err(_) => {
                tracing::error!(
                    pool = self.name,
                    in_flight = self.in_flight(),
                    "workers still in flight after forced termination"
                );
                Err(StrategyError::ShutdownStalled(grace))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sleeper(pool: &WorkerPool, delay: Duration) -> TaskHandle<&'static str> {
        pool.submit(async move {
            tokio::time::sleep(delay).await;
            Ok("done")
        })
        .expect("submit")
    }

    #[tokio::test]
    async fn capacity_bounds_concurrency() {
        // Four 40ms tasks through two workers need at least two rounds.
        let pool = WorkerPool::new("test", 2);
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| sleeper(&pool, Duration::from_millis(40)))
            .collect();
        for handle in handles {
            assert_eq!(handle.wait().await.expect("task"), "done");
        }
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn cancelled_handle_reports_cancelled_and_done() {
        let pool = WorkerPool::new("test", 2);
        let handle = sleeper(&pool, Duration::from_secs(30));
        handle.cancel();
        assert!(handle.is_cancelled());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.is_done());
        match handle.wait().await {
            Err(StrategyError::Interrupted(_)) => {}
            other => panic!("expected interrupted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wait_timeout_expires_the_wait_not_the_work() {
        let pool = WorkerPool::new("test", 2);
        let handle = sleeper(&pool, Duration::from_secs(30));
        match handle.wait_timeout(Duration::from_millis(20)).await {
            Err(StrategyError::Timeout(limit)) => {
                assert_eq!(limit, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let pool = WorkerPool::new("test", 2);
        let handle = sleeper(&pool, Duration::from_millis(10));
        assert_eq!(
            pool.shutdown(Duration::from_secs(1)).await.expect("first"),
            Shutdown::Drained
        );
        assert_eq!(
            pool.shutdown(Duration::from_secs(1)).await.expect("second"),
            Shutdown::Drained
        );
        // The task submitted before shutdown still completed.
        assert_eq!(handle.wait().await.expect("task"), "done");
    }

    #[tokio::test]
    async fn shutdown_rejects_new_work() {
        let pool = WorkerPool::new("test", 2);
        pool.shutdown(Duration::from_millis(10)).await.expect("shutdown");
        let submitted = pool.submit(async { Ok::<(), StrategyError>(()) });
        assert!(matches!(submitted, Err(StrategyError::PoolClosed(_))));
    }

    #[tokio::test]
    async fn stuck_work_is_force_terminated_within_a_bounded_interval() {
        let pool = WorkerPool::new("test", 2);
        let _handle = sleeper(&pool, Duration::from_secs(600));
        let start = Instant::now();
        assert_eq!(
            pool.shutdown(Duration::from_millis(50)).await.expect("shutdown"),
            Shutdown::Forced
        );
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(pool.in_flight(), 0);
    }
}
