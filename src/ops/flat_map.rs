//! `flat_map` / `flat_map_completable`: continue a Single with the source
//! its success value maps to.
//!
//! The outer and the inner subscription share one [`SerialDisposable`], the
//! handle the downstream receives. Whichever subscription is current sits in
//! the slot, so disposing the downstream handle cancels exactly that one.

use std::sync::Arc;

use crate::{
  disposable::{DisposableRef, SerialDisposable},
  error::{catch_fallible, Result, RxError},
  observer::{BaseObserver, CompletableObserver, SingleObserver},
  Completable, Single,
};

pub struct FlatMapObserver<O: ?Sized, F> {
  observer: Arc<O>,
  mapper: Arc<F>,
  slot: Arc<SerialDisposable>,
}

impl<O, F> BaseObserver for FlatMapObserver<O, F>
where
  O: ?Sized + BaseObserver,
  F: Send + Sync,
{
  fn on_subscribe(&self, d: DisposableRef) {
    self.slot.set(Some(d));
    self.observer.on_subscribe(self.slot.clone());
  }

  #[inline]
  fn on_error(&self, err: RxError) { self.observer.on_error(err); }
}

impl<T, U, F> SingleObserver<T> for FlatMapObserver<dyn SingleObserver<U>, F>
where
  U: Send + 'static,
  F: Fn(T) -> Result<Single<U>> + Send + Sync,
{
  fn on_success(&self, value: T) {
    match catch_fallible(|| (self.mapper)(value)) {
      Ok(inner) => inner.subscribe(Arc::new(InnerObserver {
        observer: self.observer.clone(),
        slot: self.slot.clone(),
      })),
      Err(err) => self.observer.on_error(err),
    }
  }
}

impl<T, F> SingleObserver<T> for FlatMapObserver<dyn CompletableObserver, F>
where
  F: Fn(T) -> Result<Completable> + Send + Sync,
{
  fn on_success(&self, value: T) {
    match catch_fallible(|| (self.mapper)(value)) {
      Ok(inner) => inner.subscribe(Arc::new(InnerObserver {
        observer: self.observer.clone(),
        slot: self.slot.clone(),
      })),
      Err(err) => self.observer.on_error(err),
    }
  }
}

/// Subscribed to the mapped source; swaps itself into the shared slot.
struct InnerObserver<O: ?Sized> {
  observer: Arc<O>,
  slot: Arc<SerialDisposable>,
}

impl<O: ?Sized + BaseObserver> BaseObserver for InnerObserver<O> {
  #[inline]
  fn on_subscribe(&self, d: DisposableRef) { self.slot.set(Some(d)); }

  fn on_error(&self, err: RxError) {
    self.slot.detach();
    self.observer.on_error(err);
  }
}

impl<U, O: ?Sized + SingleObserver<U>> SingleObserver<U> for InnerObserver<O> {
  fn on_success(&self, value: U) {
    self.slot.detach();
    self.observer.on_success(value);
  }
}

impl<O: ?Sized + CompletableObserver> CompletableObserver for InnerObserver<O> {
  fn on_complete(&self) {
    self.slot.detach();
    self.observer.on_complete();
  }
}

impl<T: Send + 'static> Single<T> {
  /// Map the success value to another Single and relay its outcome. An
  /// `Err` (or panic) from `mapper` fails the subscription.
  pub fn flat_map<U, F>(&self, mapper: F) -> Single<U>
  where
    U: Send + 'static,
    F: Fn(T) -> Result<Single<U>> + Send + Sync + 'static,
  {
    let source = self.clone();
    let mapper = Arc::new(mapper);
    Single::<U>::operator("flat_map", move |observer| {
      source.subscribe(Arc::new(FlatMapObserver {
        observer,
        mapper: mapper.clone(),
        slot: Arc::new(SerialDisposable::new()),
      }));
    })
  }

  /// Map the success value to a Completable and relay its completion or
  /// error.
  pub fn flat_map_completable<F>(&self, mapper: F) -> Completable
  where
    F: Fn(T) -> Result<Completable> + Send + Sync + 'static,
  {
    let source = self.clone();
    let mapper = Arc::new(mapper);
    Completable::operator("flat_map_completable", move |observer| {
      source.subscribe(Arc::new(FlatMapObserver {
        observer,
        mapper: mapper.clone(),
        slot: Arc::new(SerialDisposable::new()),
      }));
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};

  use super::*;
  use crate::{disposable::Disposable, testing::TestObserver};

  fn cancellable(flag: &Arc<AtomicBool>) -> Single<i32> {
    let flag = flag.clone();
    Single::create(move |emitter| {
      let flag = flag.clone();
      emitter.set_cancellable(move || flag.store(true, Ordering::SeqCst));
      Ok(())
    })
  }

  #[rxkit_macro::test]
  fn relays_inner_outcome() {
    let observer = TestObserver::<String>::new();
    Single::just(3).flat_map(|v| Ok(Single::just("x".repeat(v)))).subscribe(observer.clone());
    assert_eq!(observer.values(), vec!["xxx".to_string()]);

    let observer = TestObserver::<i32>::new();
    Single::just(3)
      .flat_map(|_| Ok(Single::<i32>::error(RxError::msg("inner"))))
      .subscribe(observer.clone());
    assert_eq!(observer.errors()[0].to_string(), "inner");
  }

  #[rxkit_macro::test]
  fn failing_mapper_fails_subscription() {
    let observer = TestObserver::<i32>::new();
    Single::just(1)
      .flat_map(|_| -> Result<Single<i32>> { Err(RxError::msg("no mapping")) })
      .subscribe(observer.clone());
    assert_eq!(observer.errors()[0].to_string(), "no mapping");
  }

  #[rxkit_macro::test]
  fn dispose_cancels_current_subscription() {
    let outer = Arc::new(AtomicBool::new(false));
    let observer = TestObserver::<i32>::new();
    cancellable(&outer).flat_map(|v| Ok(Single::just(v))).subscribe(observer.clone());
    observer.dispose();
    assert!(outer.load(Ordering::SeqCst));

    let inner = Arc::new(AtomicBool::new(false));
    let c_inner = inner.clone();
    let observer = TestObserver::<i32>::new();
    Single::just(1).flat_map(move |_| Ok(cancellable(&c_inner))).subscribe(observer.clone());
    assert!(!inner.load(Ordering::SeqCst));
    observer.dispose();
    assert!(inner.load(Ordering::SeqCst));
  }

  #[rxkit_macro::test]
  fn completable_continuation() {
    let observer = TestObserver::<()>::new();
    Single::just(1)
      .flat_map_completable(|_| Ok(Completable::complete()))
      .subscribe(observer.clone());
    assert_eq!(observer.completions(), 1);

    let observer = TestObserver::<()>::new();
    Single::just(1)
      .flat_map_completable(|_| Ok(Completable::error(RxError::msg("write failed"))))
      .subscribe(observer.clone());
    assert_eq!(observer.errors()[0].to_string(), "write failed");
  }
}
