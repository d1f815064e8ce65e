//! Kind specific factories and consumers of [`Maybe`].
//!
//! A `Maybe` signals one of `on_success`, `on_complete` (no value) or
//! `on_error`.

use crate::{
  disposable::{self, DisposableRef},
  emitter::MaybeEmitter,
  error::{catch_fallible, Result, RxError},
  observer::{Callbacks, DisposableObserver},
  Maybe,
};

impl<T: Send + 'static> Maybe<T> {
  /// See [`Single::create`](crate::Single::create); the emitter may also
  /// complete without a value.
  pub fn create<F>(source: F) -> Self
  where
    F: Fn(MaybeEmitter<T>) -> Result<()> + Send + Sync + 'static,
  {
    Self::factory("create", move |observer| {
      let emitter = MaybeEmitter::new(observer.clone());
      observer.on_subscribe(emitter.as_disposable());
      if let Err(err) = catch_fallible(|| source(emitter.clone())) {
        emitter.on_error(err);
      }
    })
  }

  pub fn just(value: T) -> Self
  where
    T: Clone + Sync,
  {
    Self::factory("just", move |observer| {
      observer.on_subscribe(disposable::empty());
      observer.on_success(value.clone());
    })
  }

  /// Complete without a value.
  pub fn empty() -> Self {
    Self::factory("empty", |observer| {
      observer.on_subscribe(disposable::empty());
      observer.on_complete();
    })
  }

  pub fn subscribe_by<N, E, C>(&self, on_success: N, on_error: E, on_complete: C) -> DisposableRef
  where
    N: Fn(T) + Send + Sync + 'static,
    E: Fn(RxError) + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
  {
    let observer = DisposableObserver::new(Callbacks::new(on_success, on_error, on_complete));
    self.subscribe(observer.clone());
    observer
  }
}
