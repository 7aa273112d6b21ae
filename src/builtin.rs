//! Task kinds the CLI can bind from a workflow file.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use strata_config::NodeDef;
use strata_task::{DataMap, ExecutionResult, TaskError, TaskExecutionContext, TaskExecutor};
use tokio_util::sync::CancellationToken;

/// Build the executor for a node's `kind`.
pub fn executor_for(node: &NodeDef) -> Result<Arc<dyn TaskExecutor>> {
  let params = node.params.clone();
  let executor: Arc<dyn TaskExecutor> = match node.kind.as_str() {
    "passthrough" => Arc::new(Passthrough { params }),
    "fail" => {
      let message = params
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("task failed")
        .to_string();
      Arc::new(Fail { message })
    }
    "skip" => Arc::new(Skip),
    "delay" => {
      let Some(ms) = params.get("ms").and_then(|v| v.as_u64()) else {
        bail!("node '{}': delay needs a non-negative integer 'ms' param", node.node_id);
      };
      Arc::new(Delay {
        delay: Duration::from_millis(ms),
        params,
      })
    }
    other => bail!("node '{}': unknown task kind '{}'", node.node_id, other),
  };
  Ok(executor)
}

/// Input merged with the node's params, params winning.
fn merged(input: DataMap, params: &DataMap) -> DataMap {
  let mut output = input;
  for (key, value) in params {
    output.insert(key.clone(), value.clone());
  }
  output
}

struct Passthrough {
  params: DataMap,
}

#[async_trait]
impl TaskExecutor for Passthrough {
  async fn execute(
    &self,
    context: TaskExecutionContext,
    _cancel: CancellationToken,
  ) -> Result<ExecutionResult, TaskError> {
    Ok(ExecutionResult::succeeded(merged(
      context.input_data,
      &self.params,
    )))
  }
}

struct Fail {
  message: String,
}

#[async_trait]
impl TaskExecutor for Fail {
  async fn execute(
    &self,
    _context: TaskExecutionContext,
    _cancel: CancellationToken,
  ) -> Result<ExecutionResult, TaskError> {
    Ok(ExecutionResult::failed(self.message.clone()))
  }
}

struct Skip;

#[async_trait]
impl TaskExecutor for Skip {
  async fn execute(
    &self,
    _context: TaskExecutionContext,
    _cancel: CancellationToken,
  ) -> Result<ExecutionResult, TaskError> {
    Ok(ExecutionResult::skipped("skipped by configuration"))
  }
}

struct Delay {
  delay: Duration,
  params: DataMap,
}

#[async_trait]
impl TaskExecutor for Delay {
  async fn execute(
    &self,
    context: TaskExecutionContext,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, TaskError> {
    tokio::select! {
      _ = cancel.cancelled() => Err(TaskError::Cancelled),
      _ = tokio::time::sleep(self.delay) => {
        Ok(ExecutionResult::succeeded(merged(context.input_data, &self.params)))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use strata_task::ExecutionStatus;

  fn node(kind: &str, params: serde_json::Value) -> NodeDef {
    serde_json::from_value(json!({
      "node_id": "n",
      "kind": kind,
      "params": params,
    }))
    .unwrap()
  }

  fn input(pairs: serde_json::Value) -> TaskExecutionContext {
    let serde_json::Value::Object(map) = pairs else {
      panic!("expected object");
    };
    TaskExecutionContext::default().with_input(map)
  }

  #[tokio::test]
  async fn test_passthrough_merges_params() {
    let executor = executor_for(&node("passthrough", json!({"b": 2, "a": 9}))).unwrap();
    let result = executor
      .execute(input(json!({"a": 1})), CancellationToken::new())
      .await
      .unwrap();

    assert!(result.success());
    assert_eq!(result.output_data["a"], 9);
    assert_eq!(result.output_data["b"], 2);
  }

  #[tokio::test]
  async fn test_fail_uses_message() {
    let executor = executor_for(&node("fail", json!({"message": "bad input"}))).unwrap();
    let result = executor
      .execute(TaskExecutionContext::default(), CancellationToken::new())
      .await
      .unwrap();

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("bad input"));
  }

  #[tokio::test]
  async fn test_skip() {
    let executor = executor_for(&node("skip", json!({}))).unwrap();
    let result = executor
      .execute(TaskExecutionContext::default(), CancellationToken::new())
      .await
      .unwrap();
    assert!(result.is_skipped());
  }

  #[tokio::test]
  async fn test_delay_honors_cancellation() {
    let executor = executor_for(&node("delay", json!({"ms": 10_000}))).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = executor
      .execute(TaskExecutionContext::default(), cancel)
      .await
      .unwrap_err();
    assert!(err.is_cancelled());
  }

  #[tokio::test]
  async fn test_delay_passes_through() {
    let executor = executor_for(&node("delay", json!({"ms": 1}))).unwrap();
    let result = executor
      .execute(input(json!({"x": true})), CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(result.output_data["x"], true);
    assert_eq!(result.output_data["ms"], 1);
  }

  #[test]
  fn test_unknown_kind_rejected() {
    let err = executor_for(&node("teleport", json!({}))).err().unwrap();
    assert_eq!(err.to_string(), "node 'n': unknown task kind 'teleport'");
  }

  #[test]
  fn test_delay_requires_ms() {
    assert!(executor_for(&node("delay", json!({}))).is_err());
  }
}
