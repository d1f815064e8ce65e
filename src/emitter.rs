//! Emitters: the protocol-safe facade handed to `create` callbacks.
//!
//! Every emitter forwards at most one terminal signal downstream. Later
//! terminal calls are dropped, and a dropped `on_error` is re-routed to the
//! fallback sink. Each emitter owns one swappable resource slot
//! ([`set_disposable`](SingleEmitter::set_disposable)) that is disposed when
//! the emitter terminates or the downstream disposes.
//!
//! Emitters are cheap to clone and may be moved to other threads.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  disposable::{Disposable, SerialDisposable},
  error::RxError,
  observer::BaseObserver,
  plugins,
};

/// Shared state behind the Single, Maybe and Completable emitters.
///
/// Taking `downstream` out of its slot is the exactly-once terminal step;
/// an empty slot means terminated or disposed.
struct EmitterCore<O: ?Sized> {
  downstream: Mutex<Option<Arc<O>>>,
  resource: SerialDisposable,
}

impl<O: ?Sized + BaseObserver> EmitterCore<O> {
  fn new(downstream: Arc<O>) -> Self {
    Self { downstream: Mutex::new(Some(downstream)), resource: SerialDisposable::new() }
  }

  fn terminate(&self, signal: &'static str, deliver: impl FnOnce(Arc<O>)) {
    let downstream = self.downstream.lock().take();
    match downstream {
      Some(downstream) => {
        deliver(downstream);
        self.resource.dispose();
      }
      None => tracing::debug!(signal, "emitter already terminated, signal dropped"),
    }
  }

  fn try_error(&self, err: RxError) -> Result<(), RxError> {
    let downstream = self.downstream.lock().take();
    let Some(downstream) = downstream else { return Err(err) };
    downstream.on_error(err);
    self.resource.dispose();
    Ok(())
  }

  fn error(&self, err: RxError) {
    if let Err(err) = self.try_error(err) {
      tracing::debug!("emitter already terminated, error re-routed");
      plugins::on_error(err);
    }
  }
}

impl<O: ?Sized + BaseObserver> Disposable for EmitterCore<O> {
  fn dispose(&self) {
    // Released outside the lock; its drop may call back into the emitter.
    let downstream = self.downstream.lock().take();
    drop(downstream);
    self.resource.dispose();
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.downstream.lock().is_none() }
}

/// Methods every non-stream emitter shares.
macro_rules! impl_emitter_common {
  ($name:ident $(<$t:ident>)?) => {
    impl$(<$t: 'static>)? $name$(<$t>)? {
      /// Signal failure. After a terminal signal the error goes to the
      /// fallback sink instead.
      #[inline]
      pub fn on_error(&self, err: $crate::error::RxError) { self.0.error(err) }

      /// Signal failure unless already terminated, in which case the error
      /// is handed back.
      #[inline]
      pub fn try_on_error(
        &self, err: $crate::error::RxError,
      ) -> ::std::result::Result<(), $crate::error::RxError> {
        self.0.try_error(err)
      }

      /// Replace the held resource, disposing the previous one. `None`
      /// clears the slot.
      #[inline]
      pub fn set_disposable(&self, d: Option<$crate::disposable::DisposableRef>) {
        self.0.resource.set(d);
      }

      /// Shorthand for a resource that runs `cancel` when released.
      pub fn set_cancellable<F>(&self, cancel: F)
      where
        F: FnOnce() + Send + 'static,
      {
        self.set_disposable(Some($crate::disposable::from_fn(cancel)));
      }

      /// Whether the downstream disposed or a terminal signal went out.
      #[inline]
      pub fn is_disposed(&self) -> bool { $crate::disposable::Disposable::is_disposed(&*self.0) }

      pub(crate) fn as_disposable(&self) -> $crate::disposable::DisposableRef { self.0.clone() }
    }

    impl$(<$t>)? Clone for $name$(<$t>)? {
      #[inline]
      fn clone(&self) -> Self { Self(self.0.clone()) }
    }
  };
}

mod completable;
mod maybe;
mod observable;
mod single;

pub use completable::CompletableEmitter;
pub use maybe::MaybeEmitter;
pub use observable::ObservableEmitter;
pub use single::SingleEmitter;
