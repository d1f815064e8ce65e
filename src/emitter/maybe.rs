use std::sync::Arc;

use super::EmitterCore;
use crate::observer::MaybeObserver;

/// Emitter handed to [`Maybe::create`](crate::Maybe::create).
pub struct MaybeEmitter<T>(Arc<EmitterCore<dyn MaybeObserver<T>>>);

impl<T: 'static> MaybeEmitter<T> {
  pub(crate) fn new(downstream: Arc<dyn MaybeObserver<T>>) -> Self {
    Self(Arc::new(EmitterCore::new(downstream)))
  }

  pub fn on_success(&self, value: T) {
    self.0.terminate("on_success", |downstream| downstream.on_success(value));
  }

  /// Signal that there is no value.
  pub fn on_complete(&self) {
    self.0.terminate("on_complete", |downstream| downstream.on_complete());
  }
}

impl_emitter_common!(MaybeEmitter<T>);
