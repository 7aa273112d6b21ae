use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use strata_task::ExecutionResult;
use tracing::{debug, error, info, warn};

use super::{ExecutionStrategy, covers_enabled, reject_cycle, stale_plan, unsupported};
use crate::context::RunContext;
use crate::detected::{ExecutionPlan, StrategyType};
use crate::dispatch::{input_for, prepare, run_batch};
use crate::error::StrategyError;
use crate::state::RunState;

/// Runs an arbitrary DAG by in-degree elimination.
///
/// Ready tasks are dispatched in waves of at most `max_parallelism`. After a
/// wave is merged its successors' in-degrees drop, and any that reach zero
/// join the back of the ready queue. If the queue drains before every task
/// has run, the graph has a cycle the detector did not see and the run ends
/// with a `CycleDetected` result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexGraphStrategy;

#[async_trait]
impl ExecutionStrategy for ComplexGraphStrategy {
  fn strategy_type(&self) -> StrategyType {
    StrategyType::ComplexGraph
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

    let topology = run.graph.topology();
    let total = topology.len();
    let mut in_degree: HashMap<String, usize> = topology.in_degrees();
    let mut ready: VecDeque<String> = topology
      .nodes()
      .iter()
      .filter(|id| in_degree.get(*id).copied() == Some(0))
      .cloned()
      .collect();

    let mut state = RunState::new(self.strategy_type(), total);
    let max_parallelism = run.max_parallelism();

    while !ready.is_empty() {
      if run.cancel.is_cancelled() {
        warn!(workflow_id = %run.graph.workflow_id, "run cancelled");
        return Err(StrategyError::Cancelled);
      }

      let take = ready.len().min(max_parallelism);
      let wave: Vec<String> = ready.drain(..take).collect();
      debug!(tasks = ?wave, "dispatching ready tasks");

      let mut batch = Vec::with_capacity(wave.len());
      for task_id in &wave {
        let input = input_for(topology.upstream(task_id), &state, run.graph, &run.base);
        let Some(task) = prepare(run.graph, &run.base, task_id, input) else {
          return Ok(stale_plan(run));
        };
        batch.push(task);
      }

      let outcomes = run_batch(batch, max_parallelism, &run.cancel, &run.observers).await;
      if state.merge_batch(run.graph, outcomes) {
        return Err(StrategyError::Cancelled);
      }
      state.report_progress(&run.observers);

      if state.has_failures() && run.stop_on_error() {
        info!(workflow_id = %run.graph.workflow_id, "stopping run after task failure");
        return Ok(state.stopped());
      }

      for task_id in &wave {
        for successor in topology.downstream(task_id) {
          if let Some(degree) = in_degree.get_mut(successor) {
            *degree -= 1;
            if *degree == 0 {
              ready.push_back(successor.clone());
            }
          }
        }
      }
    }

    if state.completed() < total {
      let remaining = total - state.completed();
      error!(
        workflow_id = %run.graph.workflow_id,
        remaining,
        "cycle detected at run time"
      );
      return Ok(state.cycle_detected(format!(
        "cycle detected at run time: {} task(s) never became ready",
        remaining
      )));
    }

    Ok(state.finish())
  }
}
