//! Strategy detection.
//!
//! Decision order, first match wins:
//!
//! 1. no enabled tasks: sequential over an empty list
//! 2. no edges: parallel
//! 3. a single unbranching chain: sequential in chain order
//! 4. a DAG whose elimination waves include one wider than a single task:
//!    partially parallel, one layer per wave
//! 5. anything else: complex graph over a topological order, or a cyclic
//!    plan if the graph has a cycle
//!
//! Detection is O(V + E) and runs once per run.

use std::collections::HashSet;

use strata_workflow::analysis::{peel_layers, topological_order};
use strata_workflow::{Topology, WorkflowGraph};
use tracing::info;

use crate::detected::DetectedStrategy;

/// Classifies a workflow graph into the cheapest strategy that runs it correctly.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyDetector;

impl StrategyDetector {
  pub fn new() -> Self {
    Self
  }

  pub fn detect(&self, graph: &WorkflowGraph) -> DetectedStrategy {
    let topology = graph.topology();
    let detected = classify(&topology, graph.settings.max_parallelism.get());

    info!(
      workflow_id = %graph.workflow_id,
      strategy = %detected.strategy_type,
      has_cycle = detected.has_cycle(),
      expected_parallelism = detected.expected_parallelism,
      reason = %detected.reason,
      "strategy_detected"
    );

    detected
  }
}

fn classify(topology: &Topology, max_parallelism: usize) -> DetectedStrategy {
  let task_count = topology.len();

  if task_count == 0 {
    return DetectedStrategy::sequential(Vec::new(), "nothing to run");
  }

  if topology.edge_count() == 0 {
    return DetectedStrategy::parallel(
      task_count.min(max_parallelism),
      format!("{} independent task(s) with no edges", task_count),
    );
  }

  if let Some(chain) = linear_chain(topology) {
    return DetectedStrategy::sequential(
      chain,
      format!("{} task(s) form a single unbranching chain", task_count),
    );
  }

  let peel = peel_layers(topology);
  if peel.is_complete() && peel.layers.len() >= 2 && peel.widest_layer() > 1 {
    let widest = peel.widest_layer();
    let layer_count = peel.layers.len();
    return DetectedStrategy::partially_parallel(
      peel.layers,
      topology.dependency_map(),
      widest.min(max_parallelism),
      format!(
        "{} layer(s), widest holds {} independent task(s)",
        layer_count, widest
      ),
    );
  }

  match topological_order(topology) {
    Some(order) => {
      let widest = peel.widest_layer().max(1);
      DetectedStrategy::complex_graph(
        order,
        widest.min(max_parallelism),
        "general DAG with no parallel layer",
      )
    }
    None => DetectedStrategy::cyclic(peel.unresolved),
  }
}

/// Walk a graph that may be a simple chain, returning the walk order.
///
/// Requires exactly `n - 1` edges, no task with more than one input or
/// output, exactly one start task, and a forward walk that reaches every
/// task exactly once.
fn linear_chain(topology: &Topology) -> Option<Vec<String>> {
  if topology.edge_count() + 1 != topology.len() {
    return None;
  }

  let mut start = None;
  for task_id in topology.nodes() {
    if topology.in_degree(task_id) > 1 || topology.out_degree(task_id) > 1 {
      return None;
    }
    if topology.in_degree(task_id) == 0 {
      if start.is_some() {
        return None;
      }
      start = Some(task_id);
    }
  }

  let mut current = start?;
  let mut visited: HashSet<&str> = HashSet::with_capacity(topology.len());
  let mut order = Vec::with_capacity(topology.len());

  loop {
    if !visited.insert(current.as_str()) {
      return None;
    }
    order.push(current.clone());

    match topology.downstream(current) {
      [] => break,
      [next] => current = next,
      _ => return None,
    }
  }

  (order.len() == topology.len()).then_some(order)
}
