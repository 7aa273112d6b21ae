//! Strategy errors.

use crate::detected::StrategyType;

/// Errors that escape [`ExecutionStrategy::execute`](crate::ExecutionStrategy::execute).
///
/// Task failures and cycles are reported through the returned
/// `ExecutionResult`, never through this type.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
  /// The run's cancellation token fired, or a task reported cancellation.
  #[error("run cancelled")]
  Cancelled,

  /// A strategy was handed a plan it cannot drive. This is a programming
  /// error in the caller, not a run-time condition.
  #[error("{strategy} strategy cannot execute a {plan} plan")]
  Unsupported {
    strategy: StrategyType,
    plan: &'static str,
  },
}
