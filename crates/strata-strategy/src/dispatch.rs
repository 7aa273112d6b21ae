//! Preparing and running task invocations.
//!
//! Contexts are built on the calling task while the graph is still borrowed,
//! then moved into spawned tasks together with the executor. Spawned tasks
//! never touch the graph; their results come back to the strategy, which
//! merges them one at a time.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use strata_task::{DataMap, ExecutionResult, TaskError, TaskExecutionContext, TaskExecutor};
use strata_workflow::{TaskInfo, WorkflowGraph};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument, warn};

use crate::context::RunObservers;
use crate::state::RunState;

/// The task reported cancellation, or was never dispatched because the run
/// was cancelled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TaskCancelled;

pub(crate) type TaskOutcome = Result<ExecutionResult, TaskCancelled>;

/// Everything needed to invoke one task away from the graph.
pub(crate) struct PreparedTask {
  pub info: TaskInfo,
  executor: Arc<dyn TaskExecutor>,
  context: TaskExecutionContext,
}

/// Build the invocation for `task_id` with the given input.
///
/// Globals are the base globals overlaid with the graph's variable store as
/// it stands right now.
pub(crate) fn prepare(
  graph: &WorkflowGraph,
  base: &TaskExecutionContext,
  task_id: &str,
  input_data: DataMap,
) -> Option<PreparedTask> {
  let task = graph.task(task_id)?;
  Some(PreparedTask {
    info: task.info(),
    executor: task.executor(),
    context: base.derive(input_data, graph.variables().as_map()),
  })
}

/// Input for a task with the given predecessors.
///
/// Entry tasks get the base input. Everything else gets its predecessors'
/// outputs merged flat, in predecessor order with later keys winning. Join
/// points also get every predecessor key under `{predecessor_name}_{key}`
/// so that colliding keys stay reachable.
pub(crate) fn input_for(
  predecessors: &[String],
  state: &RunState,
  graph: &WorkflowGraph,
  base: &TaskExecutionContext,
) -> DataMap {
  if predecessors.is_empty() {
    return base.input_data.clone();
  }

  let mut input = DataMap::new();
  for pred in predecessors {
    if let Some(output) = state.output_of(pred) {
      for (key, value) in output {
        input.insert(key.clone(), value.clone());
      }
    }
  }

  if predecessors.len() > 1 {
    for pred in predecessors {
      let (Some(output), Some(task)) = (state.output_of(pred), graph.task(pred)) else {
        continue;
      };
      for (key, value) in output {
        input.insert(format!("{}_{}", task.name, key), value.clone());
      }
    }
  }

  input
}

/// Invoke one prepared task and turn whatever happens into an outcome.
///
/// Executor errors and panics become failed results. Only
/// [`TaskError::Cancelled`] maps to [`TaskCancelled`].
#[instrument(
  name = "task_execute",
  skip(task, cancel, observers),
  fields(task_id = %task.info.task_id)
)]
pub(crate) async fn run_task(
  task: PreparedTask,
  cancel: CancellationToken,
  observers: &RunObservers,
) -> (TaskInfo, TaskOutcome) {
  let PreparedTask {
    info,
    executor,
    context,
  } = task;

  info!(task_name = %info.name, "task_started");
  observers.task_started(&info, &context);

  let started_at = Utc::now();
  let invocation = AssertUnwindSafe(executor.execute(context.clone(), cancel))
    .catch_unwind()
    .await;
  let finished_at = Utc::now();

  let result = match invocation {
    Ok(Ok(result)) => result,
    Ok(Err(TaskError::Cancelled)) => {
      warn!(task_id = %info.task_id, "task_cancelled");
      return (info, Err(TaskCancelled));
    }
    Ok(Err(e)) => ExecutionResult::from_error(&e),
    Err(payload) => ExecutionResult::from_error(&TaskError::panicked(panic_message(&*payload))),
  }
  .with_timestamps(started_at, finished_at);

  if result.is_failure() {
    error!(
      task_id = %info.task_id,
      task_name = %info.name,
      error = result.error.as_deref().unwrap_or(&result.message),
      "task_failed"
    );
  } else {
    info!(
      task_id = %info.task_id,
      task_name = %info.name,
      status = ?result.status,
      duration_ms = result.duration().num_milliseconds(),
      "task_completed"
    );
  }

  observers.task_completed(&info, &context, &result);
  (info, Ok(result))
}

/// Run a batch of tasks concurrently, at most `max_parallelism` at a time.
///
/// Tasks are dispatched in the given order. Once `cancel` fires nothing new
/// is dispatched, but tasks already running are awaited. Outcomes come back
/// in dispatch order, one per input task.
pub(crate) async fn run_batch(
  tasks: Vec<PreparedTask>,
  max_parallelism: usize,
  cancel: &CancellationToken,
  observers: &RunObservers,
) -> Vec<(TaskInfo, TaskOutcome)> {
  let semaphore = Arc::new(Semaphore::new(max_parallelism.max(1)));
  let mut infos = Vec::with_capacity(tasks.len());
  let mut handles = Vec::with_capacity(tasks.len());
  let mut undispatched = Vec::new();

  let mut tasks = tasks.into_iter();
  while let Some(task) = tasks.next() {
    let permit = tokio::select! {
      biased;
      _ = cancel.cancelled() => None,
      permit = semaphore.clone().acquire_owned() => permit.ok(),
    };

    let Some(permit) = permit else {
      undispatched.push(task.info);
      undispatched.extend(tasks.by_ref().map(|t| t.info));
      break;
    };

    infos.push(task.info.clone());
    let cancel = cancel.clone();
    let observers = observers.clone();
    handles.push(tokio::spawn(async move {
      let outcome = run_task(task, cancel, &observers).await;
      drop(permit);
      outcome
    }
    .in_current_span()));
  }

  let joined = futures::future::join_all(handles).await;

  let mut outcomes: Vec<(TaskInfo, TaskOutcome)> = infos
    .into_iter()
    .zip(joined)
    .map(|(info, joined)| match joined {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(task_id = %info.task_id, error = %e, "task join error");
        let result = ExecutionResult::failed(format!("task join error: {}", e));
        (info, Ok(result))
      }
    })
    .collect();

  if !undispatched.is_empty() {
    warn!(count = undispatched.len(), "run cancelled before tasks were dispatched");
  }
  outcomes.extend(undispatched.into_iter().map(|info| (info, Err(TaskCancelled))));
  outcomes
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic payload".to_string()
  }
}
