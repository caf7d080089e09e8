use std::time::Duration;

use typed_builder::TypedBuilder;

/// Plain configuration values for a comparison run. Defaults mirror the
/// simulated workload this harness was built around: a 2000ms notify, a
/// 1500ms reward, ten subjects, and a ten-worker pool.
#[derive(Clone, Debug, TypedBuilder)]
pub struct HarnessConfig {
    /// Number of independent subjects per batch.
    #[builder(default = 10)]
    pub subjects: usize,
    #[builder(default = Duration::from_millis(2000))]
    pub notify_delay: Duration,
    #[builder(default = Duration::from_millis(1500))]
    pub reward_delay: Duration,
    /// Fixed worker-pool capacity; never resized after construction.
    #[builder(default = 10)]
    pub pool_capacity: usize,
    /// Per-handle wait limit for the timeout strategy variants.
    #[builder(default = Duration::from_secs(3))]
    pub wait_timeout: Duration,
    /// Graceful drain window before pool shutdown forces termination.
    #[builder(default = Duration::from_secs(5))]
    pub shutdown_grace: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
