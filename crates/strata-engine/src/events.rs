//! Execution events and notifiers for observability.
//!
//! Events are emitted during a run so consumers can observe progress,
//! persist state, stream to UIs, etc.

use serde::{Deserialize, Serialize};
use strata_strategy::StrategyType;
use strata_task::{DataMap, ExecutionStatus};
use tokio::sync::mpsc;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A run has started.
  WorkflowStarted {
    execution_id: String,
    workflow_id: String,
  },

  /// The detector chose a strategy for the run.
  StrategyDetected {
    execution_id: String,
    strategy: StrategyType,
    reason: String,
  },

  /// A task is about to be invoked.
  TaskStarted {
    execution_id: String,
    task_id: String,
    name: String,
  },

  /// A task finished, in any status.
  TaskCompleted {
    execution_id: String,
    task_id: String,
    status: ExecutionStatus,
    output: DataMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
  },

  /// Percentage of enabled tasks completed so far.
  Progress { execution_id: String, percent: u8 },

  /// The run succeeded.
  WorkflowCompleted { execution_id: String },

  /// The run ended failed or found a cycle.
  WorkflowFailed {
    execution_id: String,
    status: ExecutionStatus,
    error: String,
  },

  /// The run was cancelled.
  WorkflowCancelled { execution_id: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event. Task events may arrive from
/// worker threads, so implementations must not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Event volume is a handful per task, and an unbounded sender never makes
/// a worker wait on a slow consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
