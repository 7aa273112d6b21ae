use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_task::{ExecutionResult, TaskExecutor};

/// A single vertex of a workflow graph.
#[derive(Clone)]
pub struct Task {
  pub task_id: String,
  pub name: String,
  pub enabled: bool,
  executor: Arc<dyn TaskExecutor>,
  last_result: Option<ExecutionResult>,
}

impl Task {
  pub fn new(
    task_id: impl Into<String>,
    name: impl Into<String>,
    executor: impl TaskExecutor + 'static,
  ) -> Self {
    Self::with_executor(task_id, name, Arc::new(executor))
  }

  pub fn with_executor(
    task_id: impl Into<String>,
    name: impl Into<String>,
    executor: Arc<dyn TaskExecutor>,
  ) -> Self {
    Self {
      task_id: task_id.into(),
      name: name.into(),
      enabled: true,
      executor,
      last_result: None,
    }
  }

  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn executor(&self) -> Arc<dyn TaskExecutor> {
    self.executor.clone()
  }

  /// Result of the most recent execution, overwritten on every run.
  pub fn last_result(&self) -> Option<&ExecutionResult> {
    self.last_result.as_ref()
  }

  pub fn set_last_result(&mut self, result: ExecutionResult) {
    self.last_result = Some(result);
  }

  pub fn info(&self) -> TaskInfo {
    TaskInfo {
      task_id: self.task_id.clone(),
      name: self.name.clone(),
    }
  }
}

impl fmt::Debug for Task {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Task")
      .field("task_id", &self.task_id)
      .field("name", &self.name)
      .field("enabled", &self.enabled)
      .field("last_result", &self.last_result)
      .finish_non_exhaustive()
  }
}

/// Identity of a task, handed to observers while the graph itself is busy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskInfo {
  pub task_id: String,
  pub name: String,
}

/// Data dependency: `to` must not start before `from` completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: String,
  pub to: String,
}

impl Edge {
  pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
    }
  }
}
