//! Baseline: no concurrency anywhere. Notify then reward on the caller's
//! own task, subjects one after another. Total time per subject is the sum
//! of both delays.

use std::time::SystemTime;

use async_trait::async_trait;

use crate::outcome::ExecutionOutcome;
use crate::work::{self, Subject};

use super::{Strategy, Workload};

pub struct SequentialStrategy {
    workload: Workload,
}

impl SequentialStrategy {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }
}

#[async_trait]
impl Strategy for SequentialStrategy {
    fn name(&self) -> &'static str {
        "sequential"
    }

    async fn register(&self, subject: &Subject) -> ExecutionOutcome {
        let started = SystemTime::now();
        tracing::info!(subject = %subject.id, "sequential registration started");
        let (notify, reward) = self.workload.requests(subject);
        let first = work::perform(&notify).await;
        let second = work::perform(&reward).await;
        ExecutionOutcome::success(self.name(), &subject.id, started, format!("{first}; {second}"))
    }

    async fn run_batch(&self, subjects: &[Subject]) -> Vec<ExecutionOutcome> {
        let mut outcomes = Vec::with_capacity(subjects.len());
        for subject in subjects {
            outcomes.push(self.register(subject).await);
        }
        outcomes
    }
}
