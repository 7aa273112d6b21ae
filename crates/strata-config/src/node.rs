use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub node_id: String,
  /// Display name, also used to namespace output keys. Defaults to `node_id`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default = "default_enabled")]
  pub enabled: bool,
  /// Name of the task kind the host binds to an executor (e.g. "passthrough").
  pub kind: String,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub params: serde_json::Map<String, serde_json::Value>,
}

impl NodeDef {
  /// The display name, falling back to the node id.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.node_id)
  }
}

fn default_enabled() -> bool {
  true
}
