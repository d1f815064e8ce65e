//! Kind specific factories and consumers of [`Observable`].
//!
//! An `Observable` emits any number of items through `on_next`, then at
//! most one of `on_complete` or `on_error`. There is no backpressure: a
//! producer pushes as fast as it likes.

use std::sync::Arc;

use crate::{
  disposable::{self, BooleanDisposable, Disposable, DisposableRef},
  emitter::ObservableEmitter,
  error::{catch_fallible, Result, RxError},
  observer::{Callbacks, DisposableObserver},
  Observable,
};

impl<T: Send + 'static> Observable<T> {
  /// The emitter serializes concurrent producers, so `source` may hand it
  /// to several threads.
  pub fn create<F>(source: F) -> Self
  where
    F: Fn(ObservableEmitter<T>) -> Result<()> + Send + Sync + 'static,
  {
    Self::factory("create", move |observer| {
      let emitter = ObservableEmitter::new(observer.clone());
      observer.on_subscribe(emitter.as_disposable());
      if let Err(err) = catch_fallible(|| source(emitter.clone())) {
        emitter.on_error(err);
      }
    })
  }

  pub fn empty() -> Self {
    Self::factory("empty", |observer| {
      observer.on_subscribe(disposable::empty());
      observer.on_complete();
    })
  }

  /// Emit every element of `iter`, then complete. Emission stops as soon as
  /// the subscription is disposed.
  ///
  /// ```
  /// use rxkit::prelude::*;
  ///
  /// Observable::from_iter(0..10).subscribe_by(|v| println!("{v},"), |_| {}, || {});
  /// ```
  pub fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
  {
    Self::factory("from_iter", move |observer| {
      let d = Arc::new(BooleanDisposable::new());
      observer.on_subscribe(d.clone());
      for v in iter.clone() {
        if d.is_disposed() {
          return;
        }
        observer.on_next(v);
      }
      if !d.is_disposed() {
        observer.on_complete();
      }
    })
  }

  pub fn subscribe_by<N, E, C>(&self, on_next: N, on_error: E, on_complete: C) -> DisposableRef
  where
    N: Fn(T) + Send + Sync + 'static,
    E: Fn(RxError) + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
  {
    let observer = DisposableObserver::new(Callbacks::new(on_next, on_error, on_complete));
    self.subscribe(observer.clone());
    observer
  }
}
