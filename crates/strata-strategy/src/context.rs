//! Per-run state handed to a strategy.

use std::fmt;
use std::sync::Arc;

use strata_task::{ExecutionResult, TaskExecutionContext};
use strata_workflow::{TaskInfo, WorkflowGraph};
use tokio_util::sync::CancellationToken;

use crate::detected::DetectedStrategy;

/// Receives the run's progress as a percentage in `0..=100`.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Fired just before a task's executor is invoked.
pub type TaskStartedCallback = Arc<dyn Fn(&TaskInfo, &TaskExecutionContext) + Send + Sync>;

/// Fired once a task's result is known, whatever its status.
pub type TaskCompletedCallback =
  Arc<dyn Fn(&TaskInfo, &TaskExecutionContext, &ExecutionResult) + Send + Sync>;

/// Optional callbacks observing a run.
///
/// Started and completed callbacks may be invoked from worker tasks, so
/// they must be thread-safe. The progress callback is only ever invoked
/// from the merge step.
#[derive(Clone, Default)]
pub struct RunObservers {
  on_progress: Option<ProgressCallback>,
  on_task_started: Option<TaskStartedCallback>,
  on_task_completed: Option<TaskCompletedCallback>,
}

impl RunObservers {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
    self.on_progress = Some(Arc::new(callback));
    self
  }

  pub fn with_task_started(
    mut self,
    callback: impl Fn(&TaskInfo, &TaskExecutionContext) + Send + Sync + 'static,
  ) -> Self {
    self.on_task_started = Some(Arc::new(callback));
    self
  }

  pub fn with_task_completed(
    mut self,
    callback: impl Fn(&TaskInfo, &TaskExecutionContext, &ExecutionResult) + Send + Sync + 'static,
  ) -> Self {
    self.on_task_completed = Some(Arc::new(callback));
    self
  }

  pub fn progress(&self, percent: u8) {
    if let Some(callback) = &self.on_progress {
      callback(percent);
    }
  }

  pub fn task_started(&self, task: &TaskInfo, context: &TaskExecutionContext) {
    if let Some(callback) = &self.on_task_started {
      callback(task, context);
    }
  }

  pub fn task_completed(
    &self,
    task: &TaskInfo,
    context: &TaskExecutionContext,
    result: &ExecutionResult,
  ) {
    if let Some(callback) = &self.on_task_completed {
      callback(task, context, result);
    }
  }
}

impl fmt::Debug for RunObservers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RunObservers")
      .field("on_progress", &self.on_progress.is_some())
      .field("on_task_started", &self.on_task_started.is_some())
      .field("on_task_completed", &self.on_task_completed.is_some())
      .finish()
  }
}

/// Everything one strategy execution needs.
///
/// The graph is borrowed mutably for the whole run, so only the strategy's
/// merge step can touch task results and the variable store. Running tasks
/// own cloned contexts and never see the graph.
pub struct RunContext<'a> {
  pub graph: &'a mut WorkflowGraph,
  /// Base context: its input feeds entry tasks and its globals underlie the
  /// graph's variable store.
  pub base: TaskExecutionContext,
  pub strategy: DetectedStrategy,
  pub cancel: CancellationToken,
  pub observers: RunObservers,
}

impl<'a> RunContext<'a> {
  pub fn new(graph: &'a mut WorkflowGraph, strategy: DetectedStrategy) -> Self {
    Self {
      graph,
      base: TaskExecutionContext::default(),
      strategy,
      cancel: CancellationToken::new(),
      observers: RunObservers::default(),
    }
  }

  pub fn with_base(mut self, base: TaskExecutionContext) -> Self {
    self.base = base;
    self
  }

  pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn with_observers(mut self, observers: RunObservers) -> Self {
    self.observers = observers;
    self
  }

  pub fn max_parallelism(&self) -> usize {
    self.graph.settings.max_parallelism.get()
  }

  pub fn stop_on_error(&self) -> bool {
    self.graph.settings.stop_on_error
  }
}
