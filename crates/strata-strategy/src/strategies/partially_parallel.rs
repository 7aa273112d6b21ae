use async_trait::async_trait;
use strata_task::ExecutionResult;
use tracing::{debug, info, warn};

use super::{ExecutionStrategy, covers_enabled, reject_cycle, stale_plan, unsupported};
use crate::context::RunContext;
use crate::detected::{ExecutionPlan, StrategyType};
use crate::dispatch::{input_for, prepare, run_batch};
use crate::error::StrategyError;
use crate::state::RunState;

/// Runs the detector's layers in order, each layer as one bounded batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartiallyParallelStrategy;

#[async_trait]
impl ExecutionStrategy for PartiallyParallelStrategy {
  fn strategy_type(&self) -> StrategyType {
    StrategyType::PartiallyParallel
  }

  async fn execute(&self, run: &mut RunContext<'_>) -> Result<ExecutionResult, StrategyError> {
    if let Some(result) = reject_cycle(run) {
      return Ok(result);
    }
    let ExecutionPlan::Layered {
      layers,
      dependencies,
    } = &run.strategy.plan
    else {
      return Err(unsupported(self.strategy_type(), &run.strategy.plan));
    };
    if !covers_enabled(layers.iter().flatten(), run.graph) {
      return Ok(stale_plan(run));
    }
    let layers = layers.clone();
    let dependencies = dependencies.clone();

    let total = layers.iter().map(Vec::len).sum();
    let mut state = RunState::new(self.strategy_type(), total);

    for (index, layer) in layers.iter().enumerate() {
      if run.cancel.is_cancelled() {
        warn!(workflow_id = %run.graph.workflow_id, layer = index, "run cancelled");
        return Err(StrategyError::Cancelled);
      }

      debug!(layer = index, tasks = ?layer, "running layer");

      let mut batch = Vec::with_capacity(layer.len());
      for task_id in layer {
        let predecessors = dependencies
          .get(task_id)
          .map(Vec::as_slice)
          .unwrap_or(&[]);
        let input = input_for(predecessors, &state, run.graph, &run.base);
        let Some(task) = prepare(run.graph, &run.base, task_id, input) else {
          return Ok(stale_plan(run));
        };
        batch.push(task);
      }

      let outcomes = run_batch(batch, run.max_parallelism(), &run.cancel, &run.observers).await;
      if state.merge_batch(run.graph, outcomes) {
        return Err(StrategyError::Cancelled);
      }
      state.report_progress(&run.observers);

      if state.has_failures() && run.stop_on_error() {
        info!(layer = index, "stopping run after task failure");
        return Ok(state.stopped());
      }
    }

    Ok(state.finish())
  }
}
