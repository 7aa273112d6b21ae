use strata_strategy::StrategyError;

/// Errors that can occur while running a workflow through the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The run was cancelled before it finished.
  #[error("workflow cancelled")]
  Cancelled,

  #[error("strategy error: {0}")]
  Strategy(StrategyError),

  #[error("workflow runner channel closed")]
  ChannelClosed,
}

impl From<StrategyError> for EngineError {
  fn from(err: StrategyError) -> Self {
    match err {
      StrategyError::Cancelled => Self::Cancelled,
      other => Self::Strategy(other),
    }
  }
}
