use std::collections::{HashMap, HashSet};

use crate::workflow::WorkflowGraph;

/// Adjacency structure over the enabled tasks of a graph.
///
/// Edges whose endpoints are not both enabled tasks are dropped here, so
/// every algorithm built on a `Topology` sees only runnable structure.
#[derive(Debug, Clone)]
pub struct Topology {
  /// Enabled task ids in insertion order.
  nodes: Vec<String>,
  /// Adjacency list: task_id -> list of downstream task_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: task_id -> list of upstream task_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  edge_count: usize,
}

impl Topology {
  pub fn new(graph: &WorkflowGraph) -> Self {
    let nodes: Vec<String> = graph.enabled_tasks().map(|t| t.task_id.clone()).collect();
    let known: HashSet<&str> = nodes.iter().map(String::as_str).collect();

    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    // Initialize all nodes
    for node_id in &nodes {
      adjacency.entry(node_id.clone()).or_default();
      reverse_adjacency.entry(node_id.clone()).or_default();
    }

    let mut edge_count = 0;
    for edge in graph.edges() {
      if !known.contains(edge.from.as_str()) || !known.contains(edge.to.as_str()) {
        continue;
      }
      adjacency
        .entry(edge.from.clone())
        .or_default()
        .push(edge.to.clone());
      reverse_adjacency
        .entry(edge.to.clone())
        .or_default()
        .push(edge.from.clone());
      edge_count += 1;
    }

    Self {
      nodes,
      adjacency,
      reverse_adjacency,
      edge_count,
    }
  }

  pub fn nodes(&self) -> &[String] {
    &self.nodes
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Number of edges between enabled tasks.
  pub fn edge_count(&self) -> usize {
    self.edge_count
  }

  pub fn contains(&self, task_id: &str) -> bool {
    self.adjacency.contains_key(task_id)
  }

  /// Get downstream tasks for a given task.
  pub fn downstream(&self, task_id: &str) -> &[String] {
    self
      .adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream tasks for a given task.
  pub fn upstream(&self, task_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn in_degree(&self, task_id: &str) -> usize {
    self.upstream(task_id).len()
  }

  pub fn out_degree(&self, task_id: &str) -> usize {
    self.downstream(task_id).len()
  }

  /// Tasks with no incoming edges, in insertion order.
  pub fn entry_points(&self) -> Vec<&str> {
    self
      .nodes
      .iter()
      .filter(|id| self.in_degree(id) == 0)
      .map(String::as_str)
      .collect()
  }

  /// Check if a task has more than one incoming edge.
  pub fn is_join_point(&self, task_id: &str) -> bool {
    self.in_degree(task_id) > 1
  }

  /// Snapshot of every task's in-degree, for elimination algorithms.
  pub fn in_degrees(&self) -> HashMap<String, usize> {
    self
      .nodes
      .iter()
      .map(|id| (id.clone(), self.in_degree(id)))
      .collect()
  }

  /// Predecessor lists for every task (empty for entry points).
  pub fn dependency_map(&self) -> HashMap<String, Vec<String>> {
    self
      .nodes
      .iter()
      .map(|id| (id.clone(), self.upstream(id).to_vec()))
      .collect()
  }
}
