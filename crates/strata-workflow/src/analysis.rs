//! Graph analysis: topological sort and cycle detection.
//!
//! All algorithms use in-degree elimination (Kahn's algorithm). Each
//! elimination wave removes every task whose remaining in-degree is zero;
//! within a wave tasks keep the order in which they became ready, so results
//! are deterministic for a given insertion order.
//!
//! # Time Complexity
//!
//! O(V + E) where V = number of enabled tasks, E = number of edges between them

use crate::graph::Topology;
use crate::workflow::WorkflowGraph;

/// Outcome of peeling a topology wave by wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPeel {
  /// One entry per elimination wave.
  pub layers: Vec<Vec<String>>,
  /// Tasks never reaching zero in-degree (on or behind a cycle), in insertion order.
  pub unresolved: Vec<String>,
}

impl LayerPeel {
  /// Every task was eliminated, i.e. the graph is acyclic.
  pub fn is_complete(&self) -> bool {
    self.unresolved.is_empty()
  }

  pub fn widest_layer(&self) -> usize {
    self.layers.iter().map(Vec::len).max().unwrap_or(0)
  }

  pub fn into_order(self) -> Option<Vec<String>> {
    self
      .is_complete()
      .then(|| self.layers.into_iter().flatten().collect())
  }
}

/// Repeatedly remove all zero in-degree tasks, recording each wave.
///
/// Stops when a wave comes up empty. Anything left over is reported in
/// [`LayerPeel::unresolved`].
pub fn peel_layers(topology: &Topology) -> LayerPeel {
  let mut in_degree = topology.in_degrees();
  let mut layers: Vec<Vec<String>> = Vec::new();

  let mut current: Vec<String> = topology
    .nodes()
    .iter()
    .filter(|id| in_degree.get(*id).copied() == Some(0))
    .cloned()
    .collect();

  while !current.is_empty() {
    let mut next = Vec::new();

    for task_id in &current {
      for dependent in topology.downstream(task_id) {
        if let Some(degree) = in_degree.get_mut(dependent) {
          *degree -= 1;
          if *degree == 0 {
            next.push(dependent.clone());
          }
        }
      }
    }

    layers.push(current);
    current = next;
  }

  let emitted: usize = layers.iter().map(Vec::len).sum();
  let unresolved = if emitted == topology.len() {
    Vec::new()
  } else {
    topology
      .nodes()
      .iter()
      .filter(|id| in_degree.get(*id).is_some_and(|d| *d > 0))
      .cloned()
      .collect()
  };

  LayerPeel { layers, unresolved }
}

/// Topological order of a topology, or `None` if it contains a cycle.
pub fn topological_order(topology: &Topology) -> Option<Vec<String>> {
  peel_layers(topology).into_order()
}

/// Topological order of the graph's enabled tasks.
///
/// Returns `None`, never a partial list, when the enabled tasks contain a cycle.
pub fn topological_sort(graph: &WorkflowGraph) -> Option<Vec<String>> {
  topological_order(&graph.topology())
}

/// True iff [`topological_sort`] fails.
pub fn has_cycle(graph: &WorkflowGraph) -> bool {
  topological_sort(graph).is_none()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Task;
  use strata_task::{DataMap, ExecutionResult, TaskError, TaskExecutionContext};

  fn noop(_ctx: TaskExecutionContext) -> Result<ExecutionResult, TaskError> {
    Ok(ExecutionResult::succeeded(DataMap::new()))
  }

  fn graph(ids: &[&str], edges: &[(&str, &str)]) -> WorkflowGraph {
    let mut graph = WorkflowGraph::new("wf", "Workflow");
    for id in ids {
      graph.add_task(Task::new(*id, *id, noop)).unwrap();
    }
    for (from, to) in edges {
      graph.add_edge(*from, *to);
    }
    graph
  }

  fn is_valid_order(graph: &WorkflowGraph, order: &[String]) -> bool {
    let position = |id: &str| order.iter().position(|o| o == id);
    graph.edges().iter().all(|e| match (position(&e.from), position(&e.to)) {
      (Some(from), Some(to)) => from < to,
      _ => true,
    })
  }

  #[test]
  fn test_empty_graph() {
    let g = graph(&[], &[]);
    assert_eq!(topological_sort(&g), Some(vec![]));
    assert!(!has_cycle(&g));
  }

  #[test]
  fn test_chain_order() {
    let g = graph(&["c", "b", "a"], &[("a", "b"), ("b", "c")]);
    let order = topological_sort(&g).unwrap();
    assert_eq!(order, vec!["a", "b", "c"]);
  }

  #[test]
  fn test_waves_keep_insertion_order() {
    let g = graph(
      &["a", "b", "c", "d", "e"],
      &[("a", "d"), ("b", "d"), ("c", "e"), ("d", "e")],
    );

    let peel = peel_layers(&g.topology());
    assert!(peel.is_complete());
    assert_eq!(
      peel.layers,
      vec![
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        vec!["d".to_string()],
        vec!["e".to_string()],
      ]
    );
    assert_eq!(peel.widest_layer(), 3);

    let order = topological_sort(&g).unwrap();
    assert!(is_valid_order(&g, &order));
  }

  #[test]
  fn test_diamond() {
    let g = graph(
      &["a", "b", "c", "d"],
      &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
    );
    let order = topological_sort(&g).unwrap();
    assert_eq!(order, vec!["a", "b", "c", "d"]);
  }

  #[test]
  fn test_two_cycle() {
    let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
    assert_eq!(topological_sort(&g), None);
    assert!(has_cycle(&g));
  }

  #[test]
  fn test_self_loop() {
    let g = graph(&["a"], &[("a", "a")]);
    assert!(has_cycle(&g));
  }

  #[test]
  fn test_cycle_behind_valid_prefix_reports_unresolved() {
    let g = graph(
      &["start", "x", "y", "tail"],
      &[("start", "x"), ("x", "y"), ("y", "x"), ("y", "tail")],
    );

    let peel = peel_layers(&g.topology());
    assert!(!peel.is_complete());
    assert_eq!(peel.layers, vec![vec!["start".to_string()]]);
    assert_eq!(peel.unresolved, vec!["x", "y", "tail"]);
    assert_eq!(peel.into_order(), None);
  }

  #[test]
  fn test_cycle_through_disabled_task_ignored() {
    let mut g = graph(&["a", "b"], &[("a", "b")]);
    g.add_task(Task::new("c", "c", noop).enabled(false))
      .unwrap();
    g.add_edge("b", "c");
    g.add_edge("c", "a");

    assert!(!has_cycle(&g));
    assert_eq!(topological_sort(&g).unwrap(), vec!["a", "b"]);
  }

  #[test]
  fn test_duplicate_edges_counted_consistently() {
    let g = graph(&["a", "b"], &[("a", "b"), ("a", "b")]);
    assert_eq!(topological_sort(&g).unwrap(), vec!["a", "b"]);
  }
}
