//! The benchmark harness: drives every configured strategy over a batch of
//! independent subjects, measures wall time per batch, and ranks the runs.
//!
//! Per run the harness walks `Idle → Dispatching → Awaiting → Aggregating`
//! for each strategy and lands in the terminal `Reported` state once all
//! strategies have been run. A batch with failures is recorded like any
//! other — the run never aborts because one strategy had a bad day, and a
//! strategy whose shutdown stalls is logged at the highest severity and
//! left behind.

use std::sync::Arc;
use std::time::Instant;

use crate::config::HarnessConfig;
use crate::pool::WorkerPool;
use crate::report::{BenchmarkRun, ComparisonReport};
use crate::strategy::{
    DeferredStrategy, ManagedStrategy, PooledStrategy, SequentialStrategy, Strategy,
    ThreadedStrategy, Workload,
};
use crate::work::Subject;

/// Phases of one comparison run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dispatching,
    Awaiting,
    Aggregating,
    Reported,
}

pub struct Harness {
    config: HarnessConfig,
    strategies: Vec<Arc<dyn Strategy>>,
    /// Shared pool backing the managed strategy; the harness acts as its
    /// container and shuts it down at the end of the run.
    managed_pool: Option<Arc<WorkerPool>>,
    state: RunState,
}

impl Harness {
    /// A harness with no strategies; add them with [`add_strategy`](Self::add_strategy).
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            strategies: Vec::new(),
            managed_pool: None,
            state: RunState::Idle,
        }
    }

    /// The full comparison: all five execution models, sharing one
    /// workload, with the managed pool owned by the harness.
    pub fn with_default_strategies(config: HarnessConfig) -> Self {
        let workload = Workload::from_config(&config);
        let managed_pool = Arc::new(WorkerPool::new("managed", config.pool_capacity));
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(SequentialStrategy::new(workload)),
            Arc::new(ThreadedStrategy::new(workload)),
            Arc::new(PooledStrategy::new(workload, config.pool_capacity)),
            Arc::new(DeferredStrategy::new(workload, config.pool_capacity)),
            Arc::new(ManagedStrategy::new(workload, Arc::clone(&managed_pool))),
        ];
        Self {
            config,
            strategies,
            managed_pool: Some(managed_pool),
            state: RunState::Idle,
        }
    }

    pub fn add_strategy(&mut self, strategy: Arc<dyn Strategy>) -> &mut Self {
        self.strategies.push(strategy);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every strategy over its own batch of subjects and rank the
    /// results by batch wall time ascending.
    pub async fn run(&mut self) -> ComparisonReport {
        let mut runs: Vec<BenchmarkRun> = Vec::with_capacity(self.strategies.len());
        let strategies = self.strategies.clone();

        for strategy in strategies {
            let name = strategy.name();
            self.state = RunState::Dispatching;
            tracing::info!(strategy = name, subjects = self.config.subjects, "dispatching batch");
            let subjects: Vec<Subject> = (0..self.config.subjects)
                .map(|i| Subject::numbered(name, i))
                .collect();

            self.state = RunState::Awaiting;
            let started = Instant::now();
            let outcomes = strategy.run_batch(&subjects).await;
            let elapsed = started.elapsed();

            self.state = RunState::Aggregating;
            let run = BenchmarkRun::from_outcomes(name, elapsed, &outcomes);
            tracing::info!(
                strategy = name,
                total_ms = elapsed.as_millis() as u64,
                ok = run.success_count,
                failed = run.failed_count,
                "batch finished"
            );
            runs.push(run);

            if let Err(err) = strategy.shutdown(self.config.shutdown_grace).await {
                tracing::error!(
                    strategy = name,
                    %err,
                    "strategy shutdown failed; continuing with remaining strategies"
                );
            }
        }

        if let Some(pool) = &self.managed_pool {
            if let Err(err) = pool.shutdown(self.config.shutdown_grace).await {
                tracing::error!(%err, "managed pool shutdown failed");
            }
        }

        self.state = RunState::Reported;
        ComparisonReport::from(runs)
    }
}
