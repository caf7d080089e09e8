//! Run the full five-strategy comparison and print the ranking.
//!
//! ```sh
//! cargo run --example compare
//! ```
//!
//! Delays are scaled down from the canonical 2000ms/1500ms workload so the
//! demo finishes quickly; pass `RUST_LOG=regatta=info` to watch the
//! per-unit lifecycle.

use std::time::Duration;

use regatta::{
    DeferredStrategy, Harness, HarnessConfig, Reporter, StdoutReporter, Strategy, Subject,
    Workload,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = HarnessConfig::builder()
        .subjects(10)
        .notify_delay(Duration::from_millis(200))
        .reward_delay(Duration::from_millis(150))
        .pool_capacity(10)
        .wait_timeout(Duration::from_millis(300))
        .shutdown_grace(Duration::from_secs(5))
        .build();

    let mut harness = Harness::with_default_strategies(config.clone());
    let report = harness.run().await;

    StdoutReporter
        .report(&report)
        .await
        .expect("stdout reporter");

    // The combinator variants, outside the ranked comparison: a deadline
    // shorter than the workflow substitutes the fallback, and a marked
    // subject recovers instead of failing.
    let deferred = DeferredStrategy::new(Workload::from_config(&config), config.pool_capacity);

    let slow = Subject::new("demo-slow", "demo-slow@example.com");
    let outcome = deferred
        .register_with_deadline(&slow, config.wait_timeout, "fallback: registration deferred")
        .await;
    println!("deadline variant: {:?} — {}", outcome.status, outcome.detail);

    let marked = Subject::new("demo-exception", "demo-exception@example.com");
    let outcome = deferred
        .register_with_recovery(&marked, "recovered: registration retried later")
        .await;
    println!("recovery variant: {:?} — {}", outcome.status, outcome.detail);

    if let Err(err) = deferred.shutdown(config.shutdown_grace).await {
        eprintln!("deferred shutdown failed: {err}");
    }
}
