//! Workflow runner with channel-based triggering.
//!
//! The `WorkflowRunner` owns one graph and an mpsc channel of input
//! payloads. Every payload re-runs the same graph, so task results and the
//! variable store carry over from run to run.

use std::sync::Arc;

use strata_task::{DataMap, TaskExecutionContext};
use strata_workflow::WorkflowGraph;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::{WorkflowEngine, WorkflowRun};
use crate::error::EngineError;

/// A runner that executes a workflow in response to input payloads.
///
/// # Usage
///
/// ```ignore
/// let runner = WorkflowRunner::new(graph, engine);
///
/// // Get sender for external triggers
/// let sender = runner.sender();
///
/// // Start the execution loop
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await?;
/// ```
pub struct WorkflowRunner {
  sender: mpsc::Sender<serde_json::Value>,
  receiver: mpsc::Receiver<serde_json::Value>,
  graph: Arc<Mutex<WorkflowGraph>>,
  engine: Arc<WorkflowEngine>,
  base: TaskExecutionContext,
}

impl WorkflowRunner {
  pub fn new(graph: WorkflowGraph, engine: Arc<WorkflowEngine>) -> Self {
    Self::with_buffer_size(graph, engine, 100)
  }

  pub fn with_buffer_size(
    graph: WorkflowGraph,
    engine: Arc<WorkflowEngine>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      graph: Arc::new(Mutex::new(graph)),
      engine,
      base: TaskExecutionContext::default(),
    }
  }

  /// Base context for every run. Each payload replaces its input data.
  pub fn with_base(mut self, base: TaskExecutionContext) -> Self {
    self.base = base;
    self
  }

  /// Get a sender handle for triggering runs.
  pub fn sender(&self) -> mpsc::Sender<serde_json::Value> {
    self.sender.clone()
  }

  /// Shared handle to the graph, e.g. to inspect results between runs.
  pub fn graph(&self) -> Arc<Mutex<WorkflowGraph>> {
    self.graph.clone()
  }

  /// Enqueue a run with the given payload.
  pub async fn run(&self, payload: serde_json::Value) -> Result<(), EngineError> {
    self
      .sender
      .send(payload)
      .await
      .map_err(|_| EngineError::ChannelClosed)
  }

  /// Start the execution loop.
  ///
  /// The runner gives up its own sender here, so the loop runs until the
  /// cancellation token fires or every handle from [`sender`](Self::sender)
  /// is dropped. A failed or cancelled run is logged and the loop keeps going.
  pub async fn start(self, cancel: CancellationToken) -> Result<(), EngineError> {
    let Self {
      sender,
      mut receiver,
      graph,
      engine,
      base,
    } = self;
    drop(sender);

    let workflow_id = graph.lock().await.workflow_id.clone();
    info!(workflow_id = %workflow_id, "starting workflow runner");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!(workflow_id = %workflow_id, "workflow runner cancelled");
          break;
        }
        payload = receiver.recv() => {
          let Some(payload) = payload else {
            info!(workflow_id = %workflow_id, "workflow runner channel closed");
            break;
          };

          match execute(&graph, &engine, &base, payload, cancel.child_token()).await {
            Ok(run) => {
              info!(
                workflow_id = %workflow_id,
                execution_id = %run.execution_id,
                status = ?run.result.status,
                "workflow execution finished"
              );
            }
            Err(EngineError::Cancelled) => {
              info!(workflow_id = %workflow_id, "workflow execution cancelled");
            }
            Err(e) => {
              error!(workflow_id = %workflow_id, error = %e, "workflow execution failed");
            }
          }
        }
      }
    }

    Ok(())
  }

  /// Execute a single run directly, without the loop.
  pub async fn execute_once(
    &self,
    payload: serde_json::Value,
    cancel: CancellationToken,
  ) -> Result<WorkflowRun, EngineError> {
    execute(&self.graph, &self.engine, &self.base, payload, cancel).await
  }
}

async fn execute(
  graph: &Mutex<WorkflowGraph>,
  engine: &WorkflowEngine,
  base: &TaskExecutionContext,
  payload: serde_json::Value,
  cancel: CancellationToken,
) -> Result<WorkflowRun, EngineError> {
  let base = base.clone().with_input(payload_input(payload));
  let mut graph = graph.lock().await;
  engine.execute(&mut graph, base, cancel).await
}

/// Objects become the input map as-is, `null` becomes an empty map, and any
/// other value is stored under `payload`.
fn payload_input(payload: serde_json::Value) -> DataMap {
  match payload {
    serde_json::Value::Object(map) => map,
    serde_json::Value::Null => DataMap::new(),
    other => {
      let mut map = DataMap::new();
      map.insert("payload".to_string(), other);
      map
    }
  }
}
