//! Terminal outcomes — one per dispatched workflow, never mutated after
//! creation and owned by the harness once recorded.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// Terminal status of a workflow. Timeout and Failed are deliberately
/// distinct: a timeout means the caller gave up waiting, not that the work
/// itself failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Timeout,
    Cancelled,
    Failed,
}

/// What one subject's workflow resolved to under one strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub strategy_name: String,
    pub subject_id: String,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub status: OutcomeStatus,
    pub detail: String,
}

impl ExecutionOutcome {
    pub fn success(
        strategy_name: &str,
        subject_id: &str,
        started_at: SystemTime,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            strategy_name: strategy_name.to_owned(),
            subject_id: subject_id.to_owned(),
            started_at,
            finished_at: SystemTime::now(),
            status: OutcomeStatus::Success,
            detail: detail.into(),
        }
    }

    /// Resolve a strategy error into its terminal status, keeping the
    /// rendered cause as the detail.
    pub fn from_error(
        strategy_name: &str,
        subject_id: &str,
        started_at: SystemTime,
        err: &StrategyError,
    ) -> Self {
        let status = match err {
            StrategyError::Interrupted(_) => OutcomeStatus::Cancelled,
            StrategyError::Timeout(_) => OutcomeStatus::Timeout,
            StrategyError::Execution(_)
            | StrategyError::PoolClosed(_)
            | StrategyError::ShutdownStalled(_) => OutcomeStatus::Failed,
        };
        Self {
            strategy_name: strategy_name.to_owned(),
            subject_id: subject_id.to_owned(),
            started_at,
            finished_at: SystemTime::now(),
            status,
            detail: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Wall time between dispatch and resolution.
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .duration_since(self.started_at)
            .unwrap_or_default()
    }
}
