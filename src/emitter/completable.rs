use std::sync::Arc;

use super::EmitterCore;
use crate::observer::CompletableObserver;

/// Emitter handed to [`Completable::create`](crate::Completable::create).
pub struct CompletableEmitter(Arc<EmitterCore<dyn CompletableObserver>>);

impl CompletableEmitter {
  pub(crate) fn new(downstream: Arc<dyn CompletableObserver>) -> Self {
    Self(Arc::new(EmitterCore::new(downstream)))
  }

  pub fn on_complete(&self) {
    self.0.terminate("on_complete", |downstream| downstream.on_complete());
  }
}

impl_emitter_common!(CompletableEmitter);
