//! Integration tests for WorkflowEngine and its notifiers.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use strata_config::ExecutionSettings;
use strata_engine::{
  ChannelNotifier, EngineError, ExecutionEvent, WorkflowEngine, WorkflowRunner,
};
use strata_strategy::{RunObservers, StrategyType};
use strata_task::{
  DataMap, ExecutionResult, ExecutionStatus, TaskError, TaskExecutionContext, TaskExecutor,
};
use strata_workflow::{Task, WorkflowGraph};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn emit(key: &'static str) -> impl Fn(TaskExecutionContext) -> Result<ExecutionResult, TaskError> {
  move |_ctx| {
    let mut output = DataMap::new();
    output.insert(key.to_string(), json!(key));
    Ok(ExecutionResult::succeeded(output))
  }
}

fn fail(_ctx: TaskExecutionContext) -> Result<ExecutionResult, TaskError> {
  Err(TaskError::failed("nope"))
}

struct WaitForCancel;

#[async_trait]
impl TaskExecutor for WaitForCancel {
  async fn execute(
    &self,
    _context: TaskExecutionContext,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, TaskError> {
    cancel.cancelled().await;
    Err(TaskError::Cancelled)
  }
}

fn fan_in_graph() -> WorkflowGraph {
  let settings = ExecutionSettings::default().with_max_parallelism(NonZeroUsize::new(2).unwrap());
  let mut graph = WorkflowGraph::new("fan-in", "Fan In").with_settings(settings);
  graph.add_task(Task::new("a", "A", emit("a"))).unwrap();
  graph.add_task(Task::new("b", "B", emit("b"))).unwrap();
  graph.add_task(Task::new("c", "C", emit("c"))).unwrap();
  graph.add_edge("a", "c");
  graph.add_edge("b", "c");
  graph
}

fn drain(receiver: &mut mpsc::UnboundedReceiver<ExecutionEvent>) -> Vec<ExecutionEvent> {
  let mut events = Vec::new();
  while let Ok(event) = receiver.try_recv() {
    events.push(event);
  }
  events
}

#[tokio::test]
async fn test_events_for_successful_run() {
  let (sender, mut receiver) = mpsc::unbounded_channel();
  let engine = WorkflowEngine::new().with_notifier(ChannelNotifier::new(sender));
  let mut graph = fan_in_graph();

  let run = engine
    .execute(&mut graph, TaskExecutionContext::default(), CancellationToken::new())
    .await
    .unwrap();

  assert!(run.result.success());
  assert_eq!(run.strategy.strategy_type, StrategyType::PartiallyParallel);

  let events = drain(&mut receiver);
  assert_eq!(
    events.first(),
    Some(&ExecutionEvent::WorkflowStarted {
      execution_id: run.execution_id.clone(),
      workflow_id: "fan-in".to_string(),
    })
  );
  assert!(matches!(
    events[1],
    ExecutionEvent::StrategyDetected {
      strategy: StrategyType::PartiallyParallel,
      ..
    }
  ));
  assert_eq!(
    events.last(),
    Some(&ExecutionEvent::WorkflowCompleted {
      execution_id: run.execution_id.clone(),
    })
  );

  let started = events
    .iter()
    .filter(|e| matches!(e, ExecutionEvent::TaskStarted { .. }))
    .count();
  let completed = events
    .iter()
    .filter(|e| matches!(e, ExecutionEvent::TaskCompleted { .. }))
    .count();
  assert_eq!(started, 3);
  assert_eq!(completed, 3);

  let progress: Vec<u8> = events
    .iter()
    .filter_map(|e| match e {
      ExecutionEvent::Progress { percent, .. } => Some(*percent),
      _ => None,
    })
    .collect();
  assert_eq!(progress, vec![66, 100]);

  for event in &events {
    let id = match event {
      ExecutionEvent::WorkflowStarted { execution_id, .. }
      | ExecutionEvent::StrategyDetected { execution_id, .. }
      | ExecutionEvent::TaskStarted { execution_id, .. }
      | ExecutionEvent::TaskCompleted { execution_id, .. }
      | ExecutionEvent::Progress { execution_id, .. }
      | ExecutionEvent::WorkflowCompleted { execution_id }
      | ExecutionEvent::WorkflowFailed { execution_id, .. }
      | ExecutionEvent::WorkflowCancelled { execution_id } => execution_id,
    };
    assert_eq!(id, &run.execution_id);
  }
}

#[tokio::test]
async fn test_caller_observers_still_fire() {
  let completed = Arc::new(AtomicUsize::new(0));
  let observers = {
    let completed = completed.clone();
    RunObservers::new().with_task_completed(move |_, _, _| {
      completed.fetch_add(1, Ordering::SeqCst);
    })
  };
  let engine = WorkflowEngine::new().with_observers(observers);
  let mut graph = fan_in_graph();

  engine
    .execute(&mut graph, TaskExecutionContext::default(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(completed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failed_run_emits_workflow_failed() {
  let (sender, mut receiver) = mpsc::unbounded_channel();
  let engine = WorkflowEngine::new().with_notifier(ChannelNotifier::new(sender));
  let mut graph = WorkflowGraph::new("failing", "Failing");
  graph.add_task(Task::new("a", "A", fail)).unwrap();

  let run = engine
    .execute(&mut graph, TaskExecutionContext::default(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(run.result.status, ExecutionStatus::Failed);
  assert!(matches!(
    drain(&mut receiver).last(),
    Some(ExecutionEvent::WorkflowFailed {
      status: ExecutionStatus::Failed,
      ..
    })
  ));
}

#[tokio::test]
async fn test_cycle_emits_workflow_failed() {
  let (sender, mut receiver) = mpsc::unbounded_channel();
  let engine = WorkflowEngine::new().with_notifier(ChannelNotifier::new(sender));
  let mut graph = WorkflowGraph::new("cyclic", "Cyclic");
  graph.add_task(Task::new("a", "A", emit("a"))).unwrap();
  graph.add_task(Task::new("b", "B", emit("b"))).unwrap();
  graph.add_edge("a", "b");
  graph.add_edge("b", "a");

  let run = engine
    .execute(&mut graph, TaskExecutionContext::default(), CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(run.result.status, ExecutionStatus::CycleDetected);
  assert!(run.strategy.has_cycle());
  let events = drain(&mut receiver);
  assert!(!events
    .iter()
    .any(|e| matches!(e, ExecutionEvent::TaskStarted { .. })));
  assert!(matches!(
    events.last(),
    Some(ExecutionEvent::WorkflowFailed {
      status: ExecutionStatus::CycleDetected,
      ..
    })
  ));
}

#[tokio::test]
async fn test_cancelled_run_emits_workflow_cancelled() {
  let (sender, mut receiver) = mpsc::unbounded_channel();
  let engine = WorkflowEngine::new().with_notifier(ChannelNotifier::new(sender));
  let mut graph = WorkflowGraph::new("slow", "Slow");
  graph.add_task(Task::new("a", "A", WaitForCancel)).unwrap();

  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(20)).await;
    trigger.cancel();
  });

  let err = engine
    .execute(&mut graph, TaskExecutionContext::default(), cancel)
    .await
    .unwrap_err();

  assert!(matches!(err, EngineError::Cancelled));
  assert!(matches!(
    drain(&mut receiver).last(),
    Some(ExecutionEvent::WorkflowCancelled { .. })
  ));
}

#[tokio::test]
async fn test_runner_reruns_the_same_graph() {
  let engine = Arc::new(WorkflowEngine::new());
  let runner = WorkflowRunner::new(fan_in_graph(), engine);

  let first = runner
    .execute_once(json!({}), CancellationToken::new())
    .await
    .unwrap();
  let second = runner
    .execute_once(json!({}), CancellationToken::new())
    .await
    .unwrap();

  assert_ne!(first.execution_id, second.execution_id);
  let keys = |r: &ExecutionResult| r.output_data.keys().cloned().collect::<Vec<_>>();
  assert_eq!(keys(&first.result), keys(&second.result));

  let graph = runner.graph();
  let graph = graph.lock().await;
  assert_eq!(graph.variables().get("C_c"), Some(&json!("c")));
  assert!(graph.task("c").unwrap().last_result().unwrap().success());
}

#[tokio::test]
async fn test_runner_loop_processes_payloads() {
  let (sender, mut receiver) = mpsc::unbounded_channel();
  let engine = Arc::new(WorkflowEngine::new().with_notifier(ChannelNotifier::new(sender)));
  let runner = WorkflowRunner::new(fan_in_graph(), engine);
  let trigger = runner.sender();

  let cancel = CancellationToken::new();
  let handle = tokio::spawn(runner.start(cancel.clone()));

  trigger.send(json!({"n": 1})).await.unwrap();
  trigger.send(json!({"n": 2})).await.unwrap();

  let mut completed = 0;
  while completed < 2 {
    match receiver.recv().await {
      Some(ExecutionEvent::WorkflowCompleted { .. }) => completed += 1,
      Some(_) => {}
      None => break,
    }
  }
  assert_eq!(completed, 2);

  cancel.cancel();
  handle.await.unwrap().unwrap();
}
