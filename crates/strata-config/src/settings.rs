use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Run-wide execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSettings {
  /// Upper bound on concurrently running tasks.
  #[serde(default = "default_max_parallelism")]
  pub max_parallelism: NonZeroUsize,
  /// Abort the remainder of a run on the first failed task.
  #[serde(default)]
  pub stop_on_error: bool,
}

impl ExecutionSettings {
  pub fn new(max_parallelism: NonZeroUsize, stop_on_error: bool) -> Self {
    Self {
      max_parallelism,
      stop_on_error,
    }
  }

  pub fn with_max_parallelism(mut self, max_parallelism: NonZeroUsize) -> Self {
    self.max_parallelism = max_parallelism;
    self
  }

  pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
    self.stop_on_error = stop_on_error;
    self
  }
}

impl Default for ExecutionSettings {
  fn default() -> Self {
    Self {
      max_parallelism: default_max_parallelism(),
      stop_on_error: false,
    }
  }
}

fn default_max_parallelism() -> NonZeroUsize {
  NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN)
}
