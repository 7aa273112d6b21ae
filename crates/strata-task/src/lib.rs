//! Task execution for strata workflows.
//!
//! This crate defines the boundary between the scheduler and the tasks it
//! drives. A task is anything implementing [`TaskExecutor`]: given a
//! [`TaskExecutionContext`] and a cancellation token it produces an
//! [`ExecutionResult`]. The scheduler never looks past this trait.

mod context;
mod error;
mod executor;
mod result;
mod services;

pub use context::TaskExecutionContext;
pub use error::TaskError;
pub use executor::TaskExecutor;
pub use result::{ExecutionResult, ExecutionStatus};
pub use services::ServiceHandle;

/// Insertion-ordered key/value data passed between tasks.
pub type DataMap = serde_json::Map<String, serde_json::Value>;
