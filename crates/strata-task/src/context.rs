use crate::DataMap;
use crate::services::ServiceHandle;

/// Everything a single task invocation gets to see.
///
/// Each invocation owns its context; contexts are never shared between
/// concurrently running tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskExecutionContext {
  /// Data from upstream task output(s).
  pub input_data: DataMap,
  /// Snapshot of the run's global variables taken when the task was prepared.
  pub global_variables: DataMap,
  /// Opaque service resolution handle, passed through untouched.
  pub services: ServiceHandle,
}

impl TaskExecutionContext {
  pub fn new(services: ServiceHandle) -> Self {
    Self {
      services,
      ..Default::default()
    }
  }

  pub fn with_input(mut self, input_data: DataMap) -> Self {
    self.input_data = input_data;
    self
  }

  pub fn with_globals(mut self, global_variables: DataMap) -> Self {
    self.global_variables = global_variables;
    self
  }

  /// Derive the context for one task: fresh input, globals overlaid with
  /// `variables`, same service handle.
  pub fn derive(&self, input_data: DataMap, variables: &DataMap) -> Self {
    let mut global_variables = self.global_variables.clone();
    for (key, value) in variables {
      global_variables.insert(key.clone(), value.clone());
    }

    Self {
      input_data,
      global_variables,
      services: self.services.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_derive_overlays_variables() {
    let mut globals = DataMap::new();
    globals.insert("region".to_string(), json!("eu"));
    globals.insert("retries".to_string(), json!(1));
    let base = TaskExecutionContext::default().with_globals(globals);

    let mut variables = DataMap::new();
    variables.insert("retries".to_string(), json!(3));
    variables.insert("fetch_rows".to_string(), json!(10));

    let mut input = DataMap::new();
    input.insert("rows".to_string(), json!(10));

    let ctx = base.derive(input, &variables);

    assert_eq!(ctx.input_data["rows"], 10);
    assert_eq!(ctx.global_variables["region"], "eu");
    assert_eq!(ctx.global_variables["retries"], 3);
    assert_eq!(ctx.global_variables["fetch_rows"], 10);
    // base untouched
    assert_eq!(base.global_variables["retries"], 1);
  }
}
