//! The detect → create → execute pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_strategy::{
  DetectedStrategy, RunContext, RunObservers, StrategyDetector, StrategyFactory,
};
use strata_task::{ExecutionResult, ExecutionStatus, TaskExecutionContext};
use strata_workflow::{TaskInfo, WorkflowGraph};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};

/// Outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
  pub execution_id: String,
  pub strategy: DetectedStrategy,
  pub result: ExecutionResult,
}

/// Runs workflow graphs: detects a strategy, builds it, and executes it.
///
/// Callbacks supplied through [`WorkflowEngine::with_observers`] keep firing;
/// the engine adds its own on top to emit [`ExecutionEvent`]s.
pub struct WorkflowEngine {
  detector: StrategyDetector,
  notifier: Arc<dyn ExecutionNotifier>,
  observers: RunObservers,
}

impl Default for WorkflowEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl WorkflowEngine {
  pub fn new() -> Self {
    Self {
      detector: StrategyDetector::new(),
      notifier: Arc::new(NoopNotifier),
      observers: RunObservers::default(),
    }
  }

  pub fn with_notifier(mut self, notifier: impl ExecutionNotifier + 'static) -> Self {
    self.notifier = Arc::new(notifier);
    self
  }

  pub fn with_observers(mut self, observers: RunObservers) -> Self {
    self.observers = observers;
    self
  }

  /// Classify the graph without running anything.
  pub fn detect(&self, graph: &WorkflowGraph) -> DetectedStrategy {
    self.detector.detect(graph)
  }

  /// Run the graph once.
  ///
  /// Task failures and cycles are reported in [`WorkflowRun::result`].
  /// Cancellation is the only run-time error.
  #[instrument(
    name = "workflow_execute",
    skip(self, graph, base, cancel),
    fields(workflow_id = %graph.workflow_id, execution_id = tracing::field::Empty)
  )]
  pub async fn execute(
    &self,
    graph: &mut WorkflowGraph,
    base: TaskExecutionContext,
    cancel: CancellationToken,
  ) -> Result<WorkflowRun, EngineError> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    tracing::Span::current().record("execution_id", execution_id.as_str());

    info!(
      execution_id = %execution_id,
      tasks = graph.enabled_count(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow_id: graph.workflow_id.clone(),
    });

    let detected = self.detect(graph);
    self.notifier.notify(ExecutionEvent::StrategyDetected {
      execution_id: execution_id.clone(),
      strategy: detected.strategy_type,
      reason: detected.reason.clone(),
    });

    let strategy = StrategyFactory::create(detected.strategy_type);
    let observers = self.bridge(&execution_id);
    let mut run = RunContext::new(graph, detected.clone())
      .with_base(base)
      .with_cancel(cancel)
      .with_observers(observers);

    match strategy.execute(&mut run).await.map_err(EngineError::from) {
      Ok(result) => {
        self.report(&execution_id, &result);
        Ok(WorkflowRun {
          execution_id,
          strategy: detected,
          result,
        })
      }
      Err(EngineError::Cancelled) => {
        warn!(execution_id = %execution_id, "workflow_cancelled");
        self
          .notifier
          .notify(ExecutionEvent::WorkflowCancelled { execution_id });
        Err(EngineError::Cancelled)
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id,
          status: ExecutionStatus::Failed,
          error: e.to_string(),
        });
        Err(e)
      }
    }
  }

  fn report(&self, execution_id: &str, result: &ExecutionResult) {
    if result.success() {
      info!(
        execution_id = %execution_id,
        message = %result.message,
        duration_ms = result.duration().num_milliseconds(),
        "workflow_completed"
      );
      self.notifier.notify(ExecutionEvent::WorkflowCompleted {
        execution_id: execution_id.to_string(),
      });
    } else {
      error!(
        execution_id = %execution_id,
        status = ?result.status,
        message = %result.message,
        "workflow_failed"
      );
      self.notifier.notify(ExecutionEvent::WorkflowFailed {
        execution_id: execution_id.to_string(),
        status: result.status,
        error: result.error.clone().unwrap_or_else(|| result.message.clone()),
      });
    }
  }

  /// Observers that emit events for `execution_id`, then forward to the
  /// caller's own callbacks.
  fn bridge(&self, execution_id: &str) -> RunObservers {
    let progress = {
      let notifier = self.notifier.clone();
      let forward = self.observers.clone();
      let execution_id = execution_id.to_string();
      move |percent: u8| {
        notifier.notify(ExecutionEvent::Progress {
          execution_id: execution_id.clone(),
          percent,
        });
        forward.progress(percent);
      }
    };

    let started = {
      let notifier = self.notifier.clone();
      let forward = self.observers.clone();
      let execution_id = execution_id.to_string();
      move |task: &TaskInfo, context: &TaskExecutionContext| {
        notifier.notify(ExecutionEvent::TaskStarted {
          execution_id: execution_id.clone(),
          task_id: task.task_id.clone(),
          name: task.name.clone(),
        });
        forward.task_started(task, context);
      }
    };

    let completed = {
      let notifier = self.notifier.clone();
      let forward = self.observers.clone();
      let execution_id = execution_id.to_string();
      move |task: &TaskInfo,
            context: &TaskExecutionContext,
            result: &ExecutionResult| {
        notifier.notify(ExecutionEvent::TaskCompleted {
          execution_id: execution_id.clone(),
          task_id: task.task_id.clone(),
          status: result.status,
          output: result.output_data.clone(),
          error: result.error.clone(),
        });
        forward.task_completed(task, context, result);
      }
    };

    RunObservers::new()
      .with_progress(progress)
      .with_task_started(started)
      .with_task_completed(completed)
  }
}
