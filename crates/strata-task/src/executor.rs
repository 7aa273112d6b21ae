//! The task execution capability.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::TaskExecutionContext;
use crate::error::TaskError;
use crate::result::ExecutionResult;

/// Executes the business logic of a single task.
///
/// Implementations own timeouts and retries. They should observe `cancel`
/// at their own suspension points and return [`TaskError::Cancelled`] when
/// it fires. The scheduler stamps start and end times on the returned result,
/// so implementations need not bother.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
  async fn execute(
    &self,
    context: TaskExecutionContext,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, TaskError>;
}

#[async_trait]
impl<F> TaskExecutor for F
where
  F: Fn(TaskExecutionContext) -> Result<ExecutionResult, TaskError> + Send + Sync,
{
  async fn execute(
    &self,
    context: TaskExecutionContext,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, TaskError> {
    if cancel.is_cancelled() {
      return Err(TaskError::Cancelled);
    }
    self(context)
  }
}
