//! Aggregation and reporting: per-strategy [`BenchmarkRun`] records, a
//! ranked [`ComparisonReport`], and the [`Reporter`] boundary that sends a
//! report somewhere (stdout by default).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::outcome::{ExecutionOutcome, OutcomeStatus};

/// Aggregate of one strategy's batch. `total_elapsed` is wall clock across
/// the whole batch, never a sum of per-subject durations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub strategy_name: String,
    pub subject_count: usize,
    pub total_elapsed: Duration,
    pub per_subject_average: Duration,
    pub success_count: usize,
    pub failed_count: usize,
    pub timeout_count: usize,
    pub cancelled_count: usize,
}

impl BenchmarkRun {
    pub fn from_outcomes(
        strategy_name: &str,
        total_elapsed: Duration,
        outcomes: &[ExecutionOutcome],
    ) -> Self {
        let mut run = Self {
            strategy_name: strategy_name.to_owned(),
            subject_count: outcomes.len(),
            total_elapsed,
            per_subject_average: Duration::ZERO,
            success_count: 0,
            failed_count: 0,
            timeout_count: 0,
            cancelled_count: 0,
        };
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Success => run.success_count += 1,
                OutcomeStatus::Failed => run.failed_count += 1,
                OutcomeStatus::Timeout => run.timeout_count += 1,
                OutcomeStatus::Cancelled => run.cancelled_count += 1,
            }
        }
        if !outcomes.is_empty() {
            run.per_subject_average = total_elapsed / outcomes.len() as u32;
        }
        run
    }
}

/// All runs of one comparison, ranked by total elapsed time ascending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub runs: Vec<BenchmarkRun>,
}

impl From<Vec<BenchmarkRun>> for ComparisonReport {
    fn from(mut runs: Vec<BenchmarkRun>) -> Self {
        runs.sort_by_key(|run| run.total_elapsed);
        Self { runs }
    }
}

impl ComparisonReport {
    pub fn fastest(&self) -> Option<&BenchmarkRun> {
        self.runs.first()
    }
}

/// Consumes reports and sends them somewhere.
#[async_trait]
pub trait Reporter {
    async fn report(&self, report: &ComparisonReport) -> Result<(), Box<dyn std::error::Error>>;
}

/// Human-readable ranking on stdout, one line per strategy.
pub struct StdoutReporter;

#[async_trait]
impl Reporter for StdoutReporter {
    async fn report(&self, report: &ComparisonReport) -> Result<(), Box<dyn std::error::Error>> {
        println!("rank  strategy          total      avg/subject  ok/fail/timeout/cancel");
        for (rank, run) in report.runs.iter().enumerate() {
            println!(
                "{:<5} {:<17} {:>7}ms {:>10}ms  {}/{}/{}/{}",
                rank + 1,
                run.strategy_name,
                run.total_elapsed.as_millis(),
                run.per_subject_average.as_millis(),
                run.success_count,
                run.failed_count,
                run.timeout_count,
                run.cancelled_count,
            );
        }
        if let Some(fastest) = report.fastest() {
            println!(
                "fastest: {} ({}ms)",
                fastest.strategy_name,
                fastest.total_elapsed.as_millis()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;
    use std::time::SystemTime;

    fn run(name: &str, elapsed_ms: u64) -> BenchmarkRun {
        BenchmarkRun {
            strategy_name: name.to_owned(),
            subject_count: 1,
            total_elapsed: Duration::from_millis(elapsed_ms),
            per_subject_average: Duration::from_millis(elapsed_ms),
            success_count: 1,
            failed_count: 0,
            timeout_count: 0,
            cancelled_count: 0,
        }
    }

    #[test]
    fn outcomes_are_counted_by_status() {
        let started = SystemTime::now();
        let outcomes = vec![
            ExecutionOutcome::success("pooled", "a", started, "ok"),
            ExecutionOutcome::from_error(
                "pooled",
                "b",
                started,
                &StrategyError::Timeout(Duration::from_secs(1)),
            ),
            ExecutionOutcome::from_error(
                "pooled",
                "c",
                started,
                &StrategyError::Interrupted("stop".into()),
            ),
        ];
        let run = BenchmarkRun::from_outcomes("pooled", Duration::from_millis(90), &outcomes);
        assert_eq!(run.subject_count, 3);
        assert_eq!(run.success_count, 1);
        assert_eq!(run.timeout_count, 1);
        assert_eq!(run.cancelled_count, 1);
        assert_eq!(run.failed_count, 0);
        assert_eq!(run.per_subject_average, Duration::from_millis(30));
    }

    #[test]
    fn report_ranks_runs_ascending() {
        let report = ComparisonReport::from(vec![
            run("sequential", 350),
            run("pooled", 120),
            run("thread-per-task", 130),
        ]);
        let names: Vec<&str> = report
            .runs
            .iter()
            .map(|r| r.strategy_name.as_str())
            .collect();
        assert_eq!(names, ["pooled", "thread-per-task", "sequential"]);
        assert_eq!(
            report.fastest().map(|r| r.strategy_name.as_str()),
            Some("pooled")
        );
    }

    #[test]
    fn empty_batch_has_a_zero_average() {
        let run = BenchmarkRun::from_outcomes("pooled", Duration::from_millis(10), &[]);
        assert_eq!(run.per_subject_average, Duration::ZERO);
    }
}
