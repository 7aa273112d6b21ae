use std::collections::HashSet;

use strata_config::ExecutionSettings;
use strata_task::ExecutionResult;

use crate::error::WorkflowError;
use crate::graph::Topology;
use crate::task::{Edge, Task};
use crate::variables::VariableStore;

/// A workflow graph ready for execution.
///
/// The graph is the unit of execution. It outlives any single run and may be
/// run again; each run overwrites the tasks' last results and adds to the
/// variable store.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
  pub workflow_id: String,
  pub name: String,
  pub settings: ExecutionSettings,
  tasks: Vec<Task>,
  edges: Vec<Edge>,
  variables: VariableStore,
}

impl WorkflowGraph {
  pub fn new(workflow_id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      name: name.into(),
      settings: ExecutionSettings::default(),
      tasks: Vec::new(),
      edges: Vec::new(),
      variables: VariableStore::new(),
    }
  }

  pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
    self.settings = settings;
    self
  }

  /// Add a task. Task ids must be unique within the graph.
  pub fn add_task(&mut self, task: Task) -> Result<(), WorkflowError> {
    if self.task(&task.task_id).is_some() {
      return Err(WorkflowError::DuplicateTask {
        task_id: task.task_id,
      });
    }
    self.tasks.push(task);
    Ok(())
  }

  /// Add an edge. Edges that reference unknown or disabled tasks are kept
  /// but ignored when the [`Topology`] is built.
  pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
    self.edges.push(Edge::new(from, to));
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  pub fn task(&self, task_id: &str) -> Option<&Task> {
    self.tasks.iter().find(|t| t.task_id == task_id)
  }

  pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
    self.tasks.iter_mut().find(|t| t.task_id == task_id)
  }

  pub fn enabled_tasks(&self) -> impl Iterator<Item = &Task> {
    self.tasks.iter().filter(|t| t.enabled)
  }

  pub fn enabled_count(&self) -> usize {
    self.enabled_tasks().count()
  }

  /// Ids of enabled tasks.
  pub fn enabled_ids(&self) -> HashSet<&str> {
    self.enabled_tasks().map(|t| t.task_id.as_str()).collect()
  }

  /// Record a task's latest result.
  pub fn record_result(
    &mut self,
    task_id: &str,
    result: ExecutionResult,
  ) -> Result<(), WorkflowError> {
    let task = self
      .task_mut(task_id)
      .ok_or_else(|| WorkflowError::TaskNotFound {
        task_id: task_id.to_string(),
      })?;
    task.set_last_result(result);
    Ok(())
  }

  pub fn variables(&self) -> &VariableStore {
    &self.variables
  }

  pub fn variables_mut(&mut self) -> &mut VariableStore {
    &mut self.variables
  }

  /// Build the adjacency structure over enabled tasks.
  pub fn topology(&self) -> Topology {
    Topology::new(self)
  }
}
