//! Turning workflow files into runnable graphs.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use strata_config::WorkflowDef;
use strata_workflow::{Task, WorkflowGraph};
use tracing::warn;

use crate::builtin;

/// Command-line adjustments applied on top of a workflow file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub max_parallelism: Option<NonZeroUsize>,
  pub stop_on_error: bool,
  pub variables: Vec<(String, serde_json::Value)>,
}

/// Locate a workflow: an existing path is used as-is, anything else is
/// looked up as `<data_dir>/workflows/<name>.json`.
pub fn resolve_path(workflow: &str, data_dir: &Path) -> Result<PathBuf> {
  let direct = PathBuf::from(workflow);
  if direct.exists() {
    return Ok(direct);
  }

  let named = data_dir.join("workflows").join(format!("{}.json", workflow));
  if named.exists() {
    return Ok(named);
  }

  bail!(
    "workflow '{}' not found (also tried {})",
    workflow,
    named.display()
  )
}

pub async fn read_definition(path: &Path) -> Result<WorkflowDef> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))
}

/// Bind every node to its built-in executor and assemble the graph.
pub fn build_graph(def: WorkflowDef, overrides: &Overrides) -> Result<WorkflowGraph> {
  let mut settings = def.settings;
  if let Some(max_parallelism) = overrides.max_parallelism {
    settings = settings.with_max_parallelism(max_parallelism);
  }
  if overrides.stop_on_error {
    settings = settings.with_stop_on_error(true);
  }

  let mut graph = WorkflowGraph::new(def.workflow_id, def.name).with_settings(settings);

  for node in &def.nodes {
    let executor = builtin::executor_for(node)?;
    let task = Task::with_executor(node.node_id.clone(), node.display_name(), executor)
      .enabled(node.enabled);
    graph
      .add_task(task)
      .with_context(|| format!("invalid workflow '{}'", graph.workflow_id))?;
  }

  let known: HashSet<&str> = def.nodes.iter().map(|n| n.node_id.as_str()).collect();
  for edge in &def.edges {
    if !known.contains(edge.from.as_str()) || !known.contains(edge.to.as_str()) {
      warn!(from = %edge.from, to = %edge.to, "edge references unknown task");
    }
    graph.add_edge(edge.from.clone(), edge.to.clone());
  }

  graph.variables_mut().extend(def.variables);
  graph
    .variables_mut()
    .extend(overrides.variables.iter().cloned());

  Ok(graph)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::io::Write;

  const WORKFLOW: &str = r#"{
    "workflow_id": "demo",
    "name": "Demo",
    "settings": { "max_parallelism": 2 },
    "variables": { "region": "eu" },
    "nodes": [
      { "node_id": "a", "name": "Fetch", "kind": "passthrough", "params": { "x": 1 } },
      { "node_id": "b", "kind": "skip" },
      { "node_id": "c", "kind": "fail", "enabled": false }
    ],
    "edges": [{ "from": "a", "to": "b" }]
  }"#;

  fn write_workflow(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
  }

  #[tokio::test]
  async fn test_read_and_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workflow(dir.path(), "demo.json", WORKFLOW);

    let def = read_definition(&path).await.unwrap();
    let graph = build_graph(def, &Overrides::default()).unwrap();

    assert_eq!(graph.workflow_id, "demo");
    assert_eq!(graph.settings.max_parallelism.get(), 2);
    assert!(!graph.settings.stop_on_error);
    assert_eq!(graph.tasks().len(), 3);
    assert_eq!(graph.enabled_count(), 2);
    assert_eq!(graph.task("a").unwrap().name, "Fetch");
    assert_eq!(graph.task("b").unwrap().name, "b");
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.variables().get("region"), Some(&json!("eu")));
  }

  #[tokio::test]
  async fn test_overrides_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workflow(dir.path(), "demo.json", WORKFLOW);
    let overrides = Overrides {
      max_parallelism: NonZeroUsize::new(7),
      stop_on_error: true,
      variables: vec![("region".to_string(), json!("us"))],
    };

    let graph = build_graph(read_definition(&path).await.unwrap(), &overrides).unwrap();

    assert_eq!(graph.settings.max_parallelism.get(), 7);
    assert!(graph.settings.stop_on_error);
    assert_eq!(graph.variables().get("region"), Some(&json!("us")));
  }

  #[tokio::test]
  async fn test_malformed_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workflow(dir.path(), "broken.json", "{ not json");

    let err = read_definition(&path).await.unwrap_err();
    assert!(err.to_string().contains("failed to parse workflow file"));
  }

  #[test]
  fn test_duplicate_ids_rejected() {
    let def: WorkflowDef = serde_json::from_value(json!({
      "workflow_id": "dup",
      "name": "Dup",
      "nodes": [
        { "node_id": "a", "kind": "skip" },
        { "node_id": "a", "kind": "skip" }
      ]
    }))
    .unwrap();

    let err = build_graph(def, &Overrides::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("duplicate task id"));
  }

  #[test]
  fn test_unknown_kind_rejected() {
    let def: WorkflowDef = serde_json::from_value(json!({
      "workflow_id": "odd",
      "name": "Odd",
      "nodes": [{ "node_id": "a", "kind": "teleport" }]
    }))
    .unwrap();

    assert!(build_graph(def, &Overrides::default()).is_err());
  }

  #[test]
  fn test_resolve_by_name_in_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("workflows")).unwrap();
    let expected = write_workflow(&dir.path().join("workflows"), "nightly.json", WORKFLOW);

    assert_eq!(resolve_path("nightly", dir.path()).unwrap(), expected);
    assert!(resolve_path("missing", dir.path()).is_err());
  }
}
