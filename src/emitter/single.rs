use std::sync::Arc;

use super::EmitterCore;
use crate::observer::SingleObserver;

/// Emitter handed to [`Single::create`](crate::Single::create).
pub struct SingleEmitter<T>(Arc<EmitterCore<dyn SingleObserver<T>>>);

impl<T: 'static> SingleEmitter<T> {
  pub(crate) fn new(downstream: Arc<dyn SingleObserver<T>>) -> Self {
    Self(Arc::new(EmitterCore::new(downstream)))
  }

  /// Signal the value. Dropped after a terminal signal.
  pub fn on_success(&self, value: T) {
    self.0.terminate("on_success", |downstream| downstream.on_success(value));
  }
}

impl_emitter_common!(SingleEmitter<T>);
