//! Strategy selection and execution for strata workflow graphs.
//!
//! # Architecture
//!
//! ```text
//! WorkflowGraph
//!   ↓
//! StrategyDetector::detect() → DetectedStrategy { type, plan, reason }
//!   ↓
//! StrategyFactory::create(type) → Box<dyn ExecutionStrategy>
//!   ↓
//! ExecutionStrategy::execute(&mut RunContext) → ExecutionResult
//! ```
//!
//! The detector never executes anything, and strategies consume the plan the
//! detector computed instead of re-analysing the graph. The one exception is
//! [`ComplexGraphStrategy`], which re-derives its ready queue from in-degrees
//! so that a cycle missed during detection still surfaces as a
//! `CycleDetected` result rather than a hang.
//!
//! Tasks in a batch run concurrently, bounded by `max_parallelism`. Their
//! results are merged one at a time once the batch finishes; that merge step
//! is the only place the graph's variable store and last-result slots change.

mod context;
mod detected;
mod detector;
mod dispatch;
mod error;
mod factory;
mod state;
mod strategies;

pub use context::{
  ProgressCallback, RunContext, RunObservers, TaskCompletedCallback, TaskStartedCallback,
};
pub use detected::{DetectedStrategy, ExecutionPlan, StrategyType};
pub use detector::StrategyDetector;
pub use error::StrategyError;
pub use factory::StrategyFactory;
pub use strategies::{
  ComplexGraphStrategy, ExecutionStrategy, ParallelStrategy, PartiallyParallelStrategy,
  SequentialStrategy,
};
