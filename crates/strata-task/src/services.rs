use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to whatever service resolution the host application provides.
///
/// The scheduler only clones this into each task's context. Tasks that know
/// the concrete type can get it back with [`ServiceHandle::downcast`].
#[derive(Clone, Default)]
pub struct ServiceHandle(Option<Arc<dyn Any + Send + Sync>>);

impl ServiceHandle {
  pub fn new<T: Any + Send + Sync>(services: T) -> Self {
    Self(Some(Arc::new(services)))
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_none()
  }

  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.0.clone()?.downcast::<T>().ok()
  }
}

impl fmt::Debug for ServiceHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceHandle")
      .field("present", &self.0.is_some())
      .finish()
  }
}
