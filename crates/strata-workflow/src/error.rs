use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("duplicate task id: {task_id}")]
  DuplicateTask { task_id: String },

  #[error("task not found: {task_id}")]
  TaskNotFound { task_id: String },
}
