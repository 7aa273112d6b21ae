use serde::{Deserialize, Serialize};

use crate::edge::EdgeDef;
use crate::node::NodeDef;
use crate::settings::ExecutionSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,
  #[serde(default)]
  pub settings: ExecutionSettings,
  /// Initial contents of the shared variable store.
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub variables: serde_json::Map<String, serde_json::Value>,
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
}
