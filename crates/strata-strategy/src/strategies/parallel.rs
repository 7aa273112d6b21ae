use async_trait::async_trait;
use strata_task::ExecutionResult;
use tracing::{info, warn};

use super::{ExecutionStrategy, reject_cycle, unsupported};
use crate::context::RunContext;
use crate::detected::{ExecutionPlan, StrategyType};
use crate::dispatch::{prepare, run_batch};
use crate::error::StrategyError;
use crate::state::RunState;

/// Runs every enabled task at once, bounded by max parallelism.
///
/// All tasks get the base input. Stop-on-error is evaluated only after the
/// whole batch has finished, so a failing task never aborts its siblings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelStrategy;

#[async_trait]
impl ExecutionStrategy for ParallelStrategy {
  fn strategy_type(&self) -> StrategyType {
    StrategyType::Parallel
  }

  async fn execute(&self, run: &mut RunContext<'_>) -> Result<ExecutionResult, StrategyError> {
    if let Some(result) = reject_cycle(run) {
      return Ok(result);
    }
    if run.strategy.plan != ExecutionPlan::Unordered {
      return Err(unsupported(self.strategy_type(), &run.strategy.plan));
    }

    let ids: Vec<String> = run
      .graph
      .enabled_tasks()
      .map(|t| t.task_id.clone())
      .collect();
    let mut state = RunState::new(self.strategy_type(), ids.len());

    if run.cancel.is_cancelled() {
      warn!(workflow_id = %run.graph.workflow_id, "run cancelled");
      return Err(StrategyError::Cancelled);
    }

    let graph = &*run.graph;
    let batch = ids
      .iter()
      .filter_map(|id| prepare(graph, &run.base, id, run.base.input_data.clone()))
      .collect();
    let outcomes = run_batch(batch, run.max_parallelism(), &run.cancel, &run.observers).await;

    if state.merge_batch(run.graph, outcomes) {
      return Err(StrategyError::Cancelled);
    }
    state.report_progress(&run.observers);

    if state.has_failures() && run.stop_on_error() {
      info!(workflow_id = %run.graph.workflow_id, "stopping run after task failure");
      return Ok(state.stopped());
    }
    Ok(state.finish())
  }
}
