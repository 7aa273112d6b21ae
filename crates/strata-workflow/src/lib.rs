//! Strata Workflow
//!
//! This crate provides the runnable workflow representation for Strata.
//! A [`WorkflowGraph`] owns already-instantiated tasks, the data-dependency
//! edges between them, the execution settings, and the shared variable store
//! used to pass data between tasks that are not directly wired.
//!
//! Key differences from `strata-config`:
//! - Tasks carry their executor, not just a kind name
//! - Task ids are guaranteed unique
//! - Disabled tasks and edges touching them are excluded from [`Topology`]
//! - The graph outlives a single run and records each task's last result
//!
//! Graph algorithms (topological sort, cycle detection, layer peeling) live in
//! [`analysis`].

pub mod analysis;
mod error;
mod graph;
mod task;
mod variables;
mod workflow;

pub use error::WorkflowError;
pub use graph::Topology;
pub use task::{Edge, Task, TaskInfo};
pub use variables::VariableStore;
pub use workflow::WorkflowGraph;
