//! Bookkeeping shared by all strategies: the serialized merge point.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use strata_task::{DataMap, ExecutionResult};
use strata_workflow::{TaskInfo, WorkflowGraph};

use crate::context::RunObservers;
use crate::detected::StrategyType;
use crate::dispatch::TaskOutcome;

/// Accumulated state of one run.
///
/// Every mutation goes through `&mut self` while the strategy also holds the
/// graph mutably, so merges are serialized without a lock.
#[derive(Debug)]
pub(crate) struct RunState {
  strategy: StrategyType,
  total: usize,
  completed: usize,
  started_at: DateTime<Utc>,
  /// Every non-failed task output under `{task_name}_{key}`.
  aggregate: DataMap,
  /// Raw outputs of non-failed tasks, keyed by task id, for downstream input.
  outputs: HashMap<String, DataMap>,
  /// Names of failed tasks in merge order.
  failed: Vec<String>,
}

impl RunState {
  pub fn new(strategy: StrategyType, total: usize) -> Self {
    Self {
      strategy,
      total,
      completed: 0,
      started_at: Utc::now(),
      aggregate: DataMap::new(),
      outputs: HashMap::new(),
      failed: Vec::new(),
    }
  }

  /// Merge one task result. Returns `true` if the task failed.
  ///
  /// Failed outputs are kept out of the aggregate and the variable store,
  /// but the result itself is still recorded on the task.
  pub fn record(&mut self, graph: &mut WorkflowGraph, info: &TaskInfo, result: ExecutionResult) -> bool {
    let failed = result.is_failure();

    if failed {
      self.failed.push(info.name.clone());
    } else {
      let variables = graph.variables_mut();
      for (key, value) in &result.output_data {
        let namespaced = format!("{}_{}", info.name, key);
        variables.set(namespaced.clone(), value.clone());
        self.aggregate.insert(namespaced, value.clone());
      }
      self
        .outputs
        .insert(info.task_id.clone(), result.output_data.clone());
    }

    if let Some(task) = graph.task_mut(&info.task_id) {
      task.set_last_result(result);
    }
    self.completed += 1;
    failed
  }

  /// Merge a batch in dispatch order. Returns `true` if any task was
  /// cancelled; the others are still merged.
  pub fn merge_batch(
    &mut self,
    graph: &mut WorkflowGraph,
    outcomes: Vec<(TaskInfo, TaskOutcome)>,
  ) -> bool {
    let mut cancelled = false;
    for (info, outcome) in outcomes {
      match outcome {
        Ok(result) => {
          self.record(graph, &info, result);
        }
        Err(_) => cancelled = true,
      }
    }
    cancelled
  }

  pub fn output_of(&self, task_id: &str) -> Option<&DataMap> {
    self.outputs.get(task_id)
  }

  pub fn completed(&self) -> usize {
    self.completed
  }

  /// `floor(completed * 100 / total)`, or 100 for an empty run.
  pub fn progress(&self) -> u8 {
    if self.total == 0 {
      return 100;
    }
    let percent = (self.completed * 100 / self.total).min(100);
    u8::try_from(percent).unwrap_or(100)
  }

  pub fn report_progress(&self, observers: &RunObservers) {
    observers.progress(self.progress());
  }

  pub fn has_failures(&self) -> bool {
    !self.failed.is_empty()
  }

  /// Result of a run aborted by stop-on-error.
  pub fn stopped(self) -> ExecutionResult {
    let message = format!("stopped after task(s) failed: {}", self.failed.join(", "));
    ExecutionResult::failed(message)
      .with_output(self.aggregate)
      .with_timestamps(self.started_at, Utc::now())
  }

  /// Result of a run that got through every task it could.
  pub fn finish(self) -> ExecutionResult {
    let result = if self.failed.is_empty() {
      let message = if self.total == 0 {
        "nothing to run".to_string()
      } else {
        format!(
          "executed {} task(s) using {} strategy",
          self.completed, self.strategy
        )
      };
      ExecutionResult::succeeded(self.aggregate).with_message(message)
    } else {
      let message = format!(
        "completed with {} failed task(s): {}",
        self.failed.len(),
        self.failed.join(", ")
      );
      ExecutionResult::failed(message).with_output(self.aggregate)
    };
    result.with_timestamps(self.started_at, Utc::now())
  }

  /// Result of a run that found a cycle, carrying whatever ran before it.
  pub fn cycle_detected(self, message: impl Into<String>) -> ExecutionResult {
    ExecutionResult::cycle_detected(message, self.aggregate)
      .with_timestamps(self.started_at, Utc::now())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use strata_task::{ExecutionStatus, TaskError, TaskExecutionContext};
  use strata_workflow::Task;

  fn noop(_ctx: TaskExecutionContext) -> Result<ExecutionResult, TaskError> {
    Ok(ExecutionResult::succeeded(DataMap::new()))
  }

  fn graph() -> WorkflowGraph {
    let mut graph = WorkflowGraph::new("wf", "Workflow");
    graph.add_task(Task::new("a", "Alpha", noop)).unwrap();
    graph.add_task(Task::new("b", "Beta", noop)).unwrap();
    graph.add_task(Task::new("c", "Gamma", noop)).unwrap();
    graph
  }

  fn info(graph: &WorkflowGraph, id: &str) -> TaskInfo {
    graph.task(id).unwrap().info()
  }

  fn output(pairs: &[(&str, serde_json::Value)]) -> DataMap {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn test_record_namespaces_outputs() {
    let mut g = graph();
    let mut state = RunState::new(StrategyType::Sequential, 3);

    let a = info(&g, "a");
    let failed = state.record(&mut g, &a, ExecutionResult::succeeded(output(&[("x", json!(1))])));

    assert!(!failed);
    assert_eq!(g.variables().get("Alpha_x"), Some(&json!(1)));
    assert_eq!(state.output_of("a").unwrap()["x"], 1);
    assert!(g.task("a").unwrap().last_result().unwrap().success());
    assert_eq!(state.progress(), 33);
  }

  #[test]
  fn test_failed_output_not_merged() {
    let mut g = graph();
    let mut state = RunState::new(StrategyType::Parallel, 3);

    let b = info(&g, "b");
    let result = ExecutionResult::failed("boom").with_output(output(&[("x", json!(2))]));
    assert!(state.record(&mut g, &b, result));

    assert!(g.variables().is_empty());
    assert!(state.output_of("b").is_none());
    assert_eq!(
      g.task("b").unwrap().last_result().unwrap().status,
      ExecutionStatus::Failed
    );

    let finished = state.finish();
    assert_eq!(finished.status, ExecutionStatus::Failed);
    assert_eq!(finished.message, "completed with 1 failed task(s): Beta");
  }

  #[test]
  fn test_skipped_is_not_a_failure() {
    let mut g = graph();
    let mut state = RunState::new(StrategyType::Parallel, 1);

    let c = info(&g, "c");
    assert!(!state.record(&mut g, &c, ExecutionResult::skipped("not today")));
    assert!(!state.has_failures());
    assert_eq!(state.finish().status, ExecutionStatus::Succeeded);
  }

  #[test]
  fn test_progress_of_empty_run() {
    let state = RunState::new(StrategyType::Sequential, 0);
    assert_eq!(state.progress(), 100);

    let result = state.finish();
    assert!(result.success());
    assert_eq!(result.message, "nothing to run");
  }

  #[test]
  fn test_stopped_keeps_partial_aggregate() {
    let mut g = graph();
    let mut state = RunState::new(StrategyType::Sequential, 3);

    let a = info(&g, "a");
    let b = info(&g, "b");
    state.record(&mut g, &a, ExecutionResult::succeeded(output(&[("x", json!(1))])));
    state.record(&mut g, &b, ExecutionResult::failed("boom"));

    let result = state.stopped();
    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.message, "stopped after task(s) failed: Beta");
    assert_eq!(result.output_data, output(&[("Alpha_x", json!(1))]));
  }
}
