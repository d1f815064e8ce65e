//! Kind specific factories and consumers of [`Single`].
//!
//! A `Single` signals exactly one of `on_success` or `on_error`.
//!
//! ```rust
//! use rxkit::prelude::*;
//!
//! let answer = Single::create(|emitter| {
//!   emitter.on_success(42);
//!   Ok(())
//! });
//! let handle = answer.subscribe_by(|v| println!("got {v}"), |e| eprintln!("failed: {e}"));
//! assert!(handle.is_disposed());
//! ```

use std::sync::Arc;

use crate::{
  disposable::{self, DisposableRef},
  emitter::SingleEmitter,
  error::{catch_fallible, Result, RxError},
  observer::{Callbacks, DisposableObserver},
  plugins, Single,
};

impl<T: Send + 'static> Single<T> {
  /// Bridge callback style code: `source` receives a fresh emitter per
  /// subscription. An `Err` or panic out of `source` fails the subscriber
  /// unless a terminal signal already went out, in which case it reaches
  /// the fallback sink.
  pub fn create<F>(source: F) -> Self
  where
    F: Fn(SingleEmitter<T>) -> Result<()> + Send + Sync + 'static,
  {
    Self::factory("create", move |observer| {
      let emitter = SingleEmitter::new(observer.clone());
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

  /// Subscribe with a pair of callbacks; the returned handle cancels the
  /// subscription.
  pub fn subscribe_by<N, E>(&self, on_success: N, on_error: E) -> DisposableRef
  where
    N: Fn(T) + Send + Sync + 'static,
    E: Fn(RxError) + Send + Sync + 'static,
  {
    let observer = DisposableObserver::new(Callbacks::new(on_success, on_error, ()));
    self.subscribe(observer.clone());
    observer
  }

  /// Subscribe to the value only; an error is routed to the fallback sink.
  pub fn subscribe_success<N>(&self, on_success: N) -> DisposableRef
  where
    N: Fn(T) + Send + Sync + 'static,
  {
    self.subscribe_by(on_success, plugins::on_error)
  }

  /// Subscribe and ignore the value; an error is routed to the fallback
  /// sink. The handle still cancels the subscription.
  pub fn subscribe_ignore(&self) -> DisposableRef { self.subscribe_by(|_| {}, plugins::on_error) }

  /// Subscribe with one callback receiving the outcome.
  pub fn subscribe_event<F>(&self, on_event: F) -> DisposableRef
  where
    F: Fn(Result<T>) + Send + Sync + 'static,
  {
    let on_event = Arc::new(on_event);
    let c_on_event = on_event.clone();
    self.subscribe_by(move |v| on_event(Ok(v)), move |e| c_on_event(Err(e)))
  }
}
