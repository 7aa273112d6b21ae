//! Task execution errors.

/// Errors a task executor can return.
///
/// `Cancelled` aborts the whole run. Every other variant is converted by the
/// scheduler into a failed [`ExecutionResult`](crate::ExecutionResult).
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
  /// Task observed the cancellation token and gave up.
  #[error("task cancelled")]
  Cancelled,

  /// Task input did not have the expected shape.
  #[error("invalid input: {message}")]
  InvalidInput { message: String },

  /// Task ran and failed.
  #[error("task failed: {message}")]
  Failed { message: String },

  /// Task panicked while executing.
  #[error("task panicked: {message}")]
  Panicked { message: String },
}

impl TaskError {
  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::InvalidInput {
      message: message.into(),
    }
  }

  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }

  pub fn panicked(message: impl Into<String>) -> Self {
    Self::Panicked {
      message: message.into(),
    }
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled)
  }
}
