//! Regatta — a comparative harness for task-execution strategies.
//!
//! Regatta runs the same two-step workflow — a simulated "notify" operation
//! and an independent "reward" operation, each a fixed artificial delay —
//! under several distinct concurrency execution models and compares their
//! latency, composition, timeout, cancellation, and exception-handling
//! behavior. There is no real I/O anywhere: the interesting part is the
//! scheduling, and the work units exist to make it measurable.
//!
//! # Architecture
//!
//! The main building blocks are:
//!
//! - [`Strategy`]: one concurrency execution model for a subject's two work
//!   units. Five are provided: [`SequentialStrategy`] (baseline, no
//!   concurrency), [`ThreadedStrategy`] (two unmanaged OS threads),
//!   [`PooledStrategy`] (bounded worker pool with blocking handles),
//!   [`DeferredStrategy`] (pool plus join/chain/deadline/recovery
//!   combinators), and [`ManagedStrategy`] (an injected shared pool the
//!   strategy does not own, with a fire-and-forget mode).
//! - [`WorkerPool`] and [`TaskHandle`]: the bounded scheduling substrate —
//!   non-blocking submission, wait-with-timeout, cancellation, and a
//!   two-phase (graceful, then forced) idempotent shutdown.
//! - [`ExecutionOutcome`]: the terminal record of one workflow — Success,
//!   Timeout, Cancelled, or Failed, with the timeout/failure distinction
//!   kept sharp.
//! - [`Harness`]: drives each strategy over a batch of independent
//!   subjects, measures batch wall time, and ranks the strategies.
//! - [`ComparisonReport`] and [`Reporter`]: turn the runs into
//!   operator-facing output.
//!
//! # Example
//!
//! ```no_run
//! use regatta::{Harness, HarnessConfig, Reporter, StdoutReporter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = HarnessConfig::builder()
//!         .subjects(10)
//!         .pool_capacity(10)
//!         .build();
//!
//!     let mut harness = Harness::with_default_strategies(config);
//!     let report = harness.run().await;
//!
//!     StdoutReporter.report(&report).await.unwrap();
//! }
//! ```
//!
//! # Where to start
//!
//! - [`Strategy`] for the uniform contract every execution model fills in.
//! - [`WorkerPool`] for the handle and shutdown semantics shared by the
//!   pooled, deferred, and managed strategies.
//! - `demos/compare.rs` for the runnable comparison.

pub mod config;
pub mod error;
pub mod harness;
pub mod outcome;
pub mod pool;
pub mod report;
pub mod strategy;
pub mod work;

pub use config::HarnessConfig;
pub use error::{StrategyError, WorkError};
pub use harness::{Harness, RunState};
pub use outcome::{ExecutionOutcome, OutcomeStatus};
pub use pool::{Shutdown, TaskHandle, WorkerPool};
pub use report::{BenchmarkRun, ComparisonReport, Reporter, StdoutReporter};
pub use strategy::{
    DeferredStrategy, ManagedStrategy, PooledStrategy, SequentialStrategy, Strategy,
    ThreadedStrategy, Workload,
};
pub use work::{FAILURE_MARKER, Subject, WorkKind, WorkRequest};
