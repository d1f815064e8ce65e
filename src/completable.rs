//! Kind specific factories and consumers of [`Completable`].
//!
//! A `Completable` carries no value, only `on_complete` or `on_error`.

use crate::{
  disposable::{self, DisposableRef},
  emitter::CompletableEmitter,
  error::{catch_fallible, Result, RxError},
  observer::{Callbacks, DisposableObserver},
  Completable,
};

impl Completable {
  pub fn create<F>(source: F) -> Self
  where
    F: Fn(CompletableEmitter) -> Result<()> + Send + Sync + 'static,
  {
    Self::factory("create", move |observer| {
      let emitter = CompletableEmitter::new(observer.clone());
      observer.on_subscribe(emitter.as_disposable());
      if let Err(err) = catch_fallible(|| source(emitter.clone())) {
        emitter.on_error(err);
      }
    })
  }

  /// Complete immediately.
  pub fn complete() -> Self {
    Self::factory("complete", |observer| {
      observer.on_subscribe(disposable::empty());
      observer.on_complete();
    })
  }

  pub fn subscribe_by<C, E>(&self, on_complete: C, on_error: E) -> DisposableRef
  where
    C: Fn() + Send + Sync + 'static,
    E: Fn(RxError) + Send + Sync + 'static,
  {
    let observer = DisposableObserver::new(Callbacks::new((), on_error, on_complete));
    self.subscribe(observer.clone());
    observer
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::{disposable::Disposable, testing::TestObserver};

  #[rxkit_macro::test]
  fn complete_and_error() {
    let observer = TestObserver::<()>::new();
    Completable::complete().subscribe(observer.clone());
    assert_eq!(observer.completions(), 1);

    let observer = TestObserver::<()>::new();
    Completable::error(RxError::msg("offline")).subscribe(observer.clone());
    assert_eq!(observer.errors()[0].to_string(), "offline");
    assert_eq!(observer.completions(), 0);
  }

  #[rxkit_macro::test]
  fn subscribe_by_runs_completion_callback() {
    let done = Arc::new(AtomicUsize::new(0));
    let c_done = done.clone();
    let completable = Completable::create(|emitter| {
      emitter.on_complete();
      Ok(())
    });
    let handle = completable.subscribe_by(
      move || {
        c_done.fetch_add(1, Ordering::SeqCst);
      },
      |_| {},
    );
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert!(handle.is_disposed());
  }
}
