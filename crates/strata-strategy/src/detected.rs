use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The four ways a graph can be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
  Sequential,
  Parallel,
  PartiallyParallel,
  ComplexGraph,
}

impl fmt::Display for StrategyType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Sequential => "sequential",
      Self::Parallel => "parallel",
      Self::PartiallyParallel => "partially_parallel",
      Self::ComplexGraph => "complex_graph",
    };
    f.write_str(name)
  }
}

/// Structure precomputed by the detector for the chosen strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionPlan {
  /// No ordering constraints at all.
  Unordered,
  /// Task ids in execution order.
  Ordered { order: Vec<String> },
  /// Layers of simultaneously eligible tasks, plus each task's predecessors.
  Layered {
    layers: Vec<Vec<String>>,
    dependencies: HashMap<String, Vec<String>>,
  },
  /// The enabled tasks contain a cycle; nothing can run.
  Cyclic { unresolved: Vec<String> },
}

impl ExecutionPlan {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Unordered => "unordered",
      Self::Ordered { .. } => "ordered",
      Self::Layered { .. } => "layered",
      Self::Cyclic { .. } => "cyclic",
    }
  }
}

/// Classification of a graph plus whatever the chosen strategy needs to run it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedStrategy {
  pub strategy_type: StrategyType,
  pub description: String,
  pub reason: String,
  /// How many tasks the strategy is expected to run at once.
  pub expected_parallelism: usize,
  pub plan: ExecutionPlan,
}

impl DetectedStrategy {
  pub fn sequential(order: Vec<String>, reason: impl Into<String>) -> Self {
    Self {
      strategy_type: StrategyType::Sequential,
      description: "run tasks one at a time in chain order".to_string(),
      reason: reason.into(),
      expected_parallelism: 1,
      plan: ExecutionPlan::Ordered { order },
    }
  }

  pub fn parallel(expected_parallelism: usize, reason: impl Into<String>) -> Self {
    Self {
      strategy_type: StrategyType::Parallel,
      description: "run all tasks at once, bounded by max parallelism".to_string(),
      reason: reason.into(),
      expected_parallelism,
      plan: ExecutionPlan::Unordered,
    }
  }

  pub fn partially_parallel(
    layers: Vec<Vec<String>>,
    dependencies: HashMap<String, Vec<String>>,
    expected_parallelism: usize,
    reason: impl Into<String>,
  ) -> Self {
    Self {
      strategy_type: StrategyType::PartiallyParallel,
      description: "run layer by layer, tasks within a layer in parallel".to_string(),
      reason: reason.into(),
      expected_parallelism,
      plan: ExecutionPlan::Layered {
        layers,
        dependencies,
      },
    }
  }

  pub fn complex_graph(
    order: Vec<String>,
    expected_parallelism: usize,
    reason: impl Into<String>,
  ) -> Self {
    Self {
      strategy_type: StrategyType::ComplexGraph,
      description: "run waves of ready tasks as their dependencies complete".to_string(),
      reason: reason.into(),
      expected_parallelism,
      plan: ExecutionPlan::Ordered { order },
    }
  }

  pub fn cyclic(unresolved: Vec<String>) -> Self {
    Self {
      strategy_type: StrategyType::ComplexGraph,
      description: "graph cannot be executed".to_string(),
      reason: format!("dependency cycle among tasks: {}", unresolved.join(", ")),
      expected_parallelism: 0,
      plan: ExecutionPlan::Cyclic { unresolved },
    }
  }

  pub fn has_cycle(&self) -> bool {
    matches!(self.plan, ExecutionPlan::Cyclic { .. })
  }

  /// Ordered task list, for sequential and graph plans.
  pub fn order(&self) -> Option<&[String]> {
    match &self.plan {
      ExecutionPlan::Ordered { order } => Some(order),
      _ => None,
    }
  }

  /// Layers, for layered plans.
  pub fn layers(&self) -> Option<&[Vec<String>]> {
    match &self.plan {
      ExecutionPlan::Layered { layers, .. } => Some(layers),
      _ => None,
    }
  }
}
