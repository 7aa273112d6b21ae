//! Execution result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DataMap;
use crate::error::TaskError;

/// Terminal status of a task invocation or of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Succeeded,
  Failed,
  /// Task chose not to run. Never triggers stop-on-error.
  Skipped,
  /// Graph could not be executed because of a dependency cycle.
  CycleDetected,
}

/// Result of executing one task, or of one whole graph run.
///
/// For a run, `output_data` aggregates every task's output under
/// `{task_name}_{key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
  pub status: ExecutionStatus,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub output_data: DataMap,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
  fn new(status: ExecutionStatus, message: impl Into<String>, output_data: DataMap) -> Self {
    let now = Utc::now();
    Self {
      status,
      message: message.into(),
      error: None,
      output_data,
      started_at: now,
      finished_at: now,
    }
  }

  pub fn succeeded(output_data: DataMap) -> Self {
    Self::new(ExecutionStatus::Succeeded, "completed", output_data)
  }

  pub fn failed(message: impl Into<String>) -> Self {
    let message = message.into();
    let mut result = Self::new(ExecutionStatus::Failed, message.clone(), DataMap::new());
    result.error = Some(message);
    result
  }

  /// Failed result carrying the error a task returned.
  pub fn from_error(error: &TaskError) -> Self {
    Self::failed(error.to_string())
  }

  pub fn skipped(message: impl Into<String>) -> Self {
    Self::new(ExecutionStatus::Skipped, message, DataMap::new())
  }

  pub fn cycle_detected(message: impl Into<String>, output_data: DataMap) -> Self {
    let message = message.into();
    let mut result = Self::new(ExecutionStatus::CycleDetected, message.clone(), output_data);
    result.error = Some(message);
    result
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = message.into();
    self
  }

  pub fn with_output(mut self, output_data: DataMap) -> Self {
    self.output_data = output_data;
    self
  }

  pub fn with_timestamps(mut self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
    self.started_at = started_at;
    self.finished_at = finished_at;
    self
  }

  pub fn success(&self) -> bool {
    self.status == ExecutionStatus::Succeeded
  }

  pub fn is_skipped(&self) -> bool {
    self.status == ExecutionStatus::Skipped
  }

  /// Neither successful nor skipped; the condition stop-on-error reacts to.
  pub fn is_failure(&self) -> bool {
    !self.success() && !self.is_skipped()
  }

  pub fn duration(&self) -> chrono::Duration {
    self.finished_at - self.started_at
  }
}
