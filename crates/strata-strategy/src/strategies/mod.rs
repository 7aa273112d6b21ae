//! The four execution strategies.

mod complex_graph;
mod parallel;
mod partially_parallel;
mod sequential;

use std::collections::HashSet;

use async_trait::async_trait;
use strata_task::ExecutionResult;
use strata_workflow::WorkflowGraph;
use tracing::warn;

use crate::context::RunContext;
use crate::detected::{ExecutionPlan, StrategyType};
use crate::error::StrategyError;
use crate::state::RunState;

pub use complex_graph::ComplexGraphStrategy;
pub use parallel::ParallelStrategy;
pub use partially_parallel::PartiallyParallelStrategy;
pub use sequential::SequentialStrategy;

/// Drives one run of a graph according to a detected plan.
///
/// Task failures and cycles come back as the returned result. Only
/// cancellation and a plan the strategy cannot drive surface as errors.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
  fn strategy_type(&self) -> StrategyType;

  async fn execute(&self, run: &mut RunContext<'_>) -> Result<ExecutionResult, StrategyError>;
}

/// Cycle result for a cyclic plan, before anything is invoked.
pub(crate) fn reject_cycle(run: &RunContext<'_>) -> Option<ExecutionResult> {
  let ExecutionPlan::Cyclic { unresolved } = &run.strategy.plan else {
    return None;
  };

  warn!(
    workflow_id = %run.graph.workflow_id,
    unresolved = ?unresolved,
    "refusing to run cyclic graph"
  );
  let state = RunState::new(run.strategy.strategy_type, run.graph.enabled_count());
  Some(state.cycle_detected(run.strategy.reason.clone()))
}

/// Whether `ids` name every enabled task exactly once and nothing else.
///
/// A plan that fails this was computed for a different graph; running it
/// could skip tasks or run disabled ones.
pub(crate) fn covers_enabled<'a>(
  ids: impl IntoIterator<Item = &'a String>,
  graph: &WorkflowGraph,
) -> bool {
  let enabled = graph.enabled_ids();
  let mut seen = HashSet::with_capacity(enabled.len());
  for id in ids {
    if !enabled.contains(id.as_str()) || !seen.insert(id.as_str()) {
      return false;
    }
  }
  seen.len() == enabled.len()
}

/// Result for a plan that does not match the graph it is run against.
pub(crate) fn stale_plan(run: &RunContext<'_>) -> ExecutionResult {
  warn!(workflow_id = %run.graph.workflow_id, "plan does not match enabled tasks");
  let state = RunState::new(run.strategy.strategy_type, run.graph.enabled_count());
  state.cycle_detected("execution plan does not cover the enabled tasks")
}

pub(crate) fn unsupported(strategy: StrategyType, plan: &ExecutionPlan) -> StrategyError {
  StrategyError::Unsupported {
    strategy,
    plan: plan.kind(),
  }
}
