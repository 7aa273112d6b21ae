use async_trait::async_trait;
use strata_task::{DataMap, ExecutionResult};
use tracing::{info, warn};

use super::{ExecutionStrategy, covers_enabled, reject_cycle, stale_plan, unsupported};
use crate::context::RunContext;
use crate::detected::{ExecutionPlan, StrategyType};
use crate::dispatch::{prepare, run_task};
use crate::error::StrategyError;
use crate::state::RunState;

/// Runs tasks one at a time in chain order.
///
/// The first task gets the base input; every later task gets the previous
/// task's output. A failed task hands an empty map downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialStrategy;

#[async_trait]
impl ExecutionStrategy for SequentialStrategy {
  fn strategy_type(&self) -> StrategyType {
    StrategyType::Sequential
  }

  async fn execute(&self, run: &mut RunContext<'_>) -> Result<ExecutionResult, StrategyError> {
    if let Some(result) = reject_cycle(run) {
      return Ok(result);
    }
    let ExecutionPlan::Ordered { order } = &run.strategy.plan else {
      return Err(unsupported(self.strategy_type(), &run.strategy.plan));
    };
    if !covers_enabled(order, run.graph) {
      return Ok(stale_plan(run));
    }
    let order = order.clone();

    let mut state = RunState::new(self.strategy_type(), order.len());
    let mut input = run.base.input_data.clone();

    for task_id in &order {
      if run.cancel.is_cancelled() {
        warn!(workflow_id = %run.graph.workflow_id, "run cancelled");
        return Err(StrategyError::Cancelled);
      }

      let Some(task) = prepare(run.graph, &run.base, task_id, input.clone()) else {
        return Ok(stale_plan(run));
      };

      let (info, outcome) = run_task(task, run.cancel.clone(), &run.observers).await;
      let Ok(result) = outcome else {
        return Err(StrategyError::Cancelled);
      };

      let next_input = if result.is_failure() {
        DataMap::new()
      } else {
        result.output_data.clone()
      };
      let failed = state.record(run.graph, &info, result);
      state.report_progress(&run.observers);

      if failed && run.stop_on_error() {
        info!(task_id = %info.task_id, "stopping run after task failure");
        return Ok(state.stopped());
      }
      input = next_input;
    }

    if order.is_empty() {
      state.report_progress(&run.observers);
    }
    Ok(state.finish())
  }
}
