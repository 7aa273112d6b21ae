//! Strata Workflow Engine
//!
//! This crate ties strategy detection and execution together behind a single
//! entry point, reports what happens through execution events, and provides
//! a `WorkflowRunner` for channel-based re-runs of one graph.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowRunner                         │
//! │  - owns the graph and an mpsc channel of input payloads     │
//! │  - run(payload) enqueues a run                              │
//! │  - start(cancel) runs the execution loop                    │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WorkflowEngine                          │
//! │  - detect(graph) → DetectedStrategy                         │
//! │  - execute(graph, base, cancel) → WorkflowRun               │
//! │  - bridges run callbacks into ExecutionEvents               │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ExecutionStrategy                         │
//! │  - sequential, parallel, layered or graph dispatch          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use strata_engine::{WorkflowEngine, WorkflowRunner};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = Arc::new(WorkflowEngine::new());
//! let runner = WorkflowRunner::new(graph, engine);
//!
//! // Get sender for external triggers
//! let sender = runner.sender();
//!
//! // Start the execution loop
//! let cancel = CancellationToken::new();
//! runner.start(cancel).await?;
//! ```

mod engine;
mod error;
mod events;
mod runner;

pub use engine::{WorkflowEngine, WorkflowRun};
pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use runner::WorkflowRunner;
