//! Thread-per-task: two unmanaged OS threads per subject, one per work
//! unit. The register call observes completion of both before returning,
//! and a failure on one side never cancels the other. In-flight work cannot
//! be cancelled here — abandoning the wait only stops the waiting.

use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::{StrategyError, WorkError};
use crate::outcome::ExecutionOutcome;
use crate::work::{self, Subject, WorkRequest};

use super::{Strategy, Workload};

pub struct ThreadedStrategy {
    workload: Workload,
}

impl ThreadedStrategy {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }

    /// Run one unit on a fresh thread, handing the result back over a
    /// oneshot so the caller can await it without blocking the runtime.
    fn spawn_unit(request: WorkRequest) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let message = work::perform_blocking(&request);
            // Receiver dropped means the caller stopped waiting; the work
            // itself already ran to completion either way.
            let _ = tx.send(message);
        });
        rx
    }
}

#[async_trait]
impl Strategy for ThreadedStrategy {
    fn name(&self) -> &'static str {
        "thread-per-task"
    }

    async fn register(&self, subject: &Subject) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "thread-per-task registration started");
        let (notify, reward) = self.workload.requests(subject);

        let notify_rx = Self::spawn_unit(notify);
        let reward_rx = Self::spawn_unit(reward);

        // Wait for both terminal states regardless of which side fails.
        let (notify_res, reward_res) = tokio::join!(notify_rx, reward_rx);
        match (notify_res, reward_res) {
            (Ok(first), Ok(second)) => ExecutionOutcome::success(
                self.name(),
                &subject.id,
                started,
                format!("{first}; {second}"),
            ),
            _ => {
                let err = StrategyError::Execution(WorkError::Abnormal(
                    "worker thread exited before completing".into(),
                ));
                tracing::error!(subject = %subject.id, %err, "thread-per-task registration failed");
                ExecutionOutcome::from_error(self.name(), &subject.id, started, &err)
            }
        }
    }
}
