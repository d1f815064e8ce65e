//! Map operator: transform the value of a Single or Maybe, or every item of
//! an Observable.

use std::sync::Arc;

use crate::{
  disposable::DisposableRef,
  error::{catch_callback, RxError},
  observer::{BaseObserver, MaybeObserver, Observer, SingleObserver},
  Maybe, Observable, Single,
};

/// Observer wrapper applying `func` before forwarding.
pub struct MapObserver<O: ?Sized, F> {
  observer: Arc<O>,
  func: Arc<F>,
}

impl<O, F> BaseObserver for MapObserver<O, F>
where
  O: ?Sized + BaseObserver,
  F: Send + Sync,
{
  #[inline]
  fn on_subscribe(&self, d: DisposableRef) { self.observer.on_subscribe(d); }

  #[inline]
  fn on_error(&self, err: RxError) { self.observer.on_error(err); }
}

impl<T, U, O, F> SingleObserver<T> for MapObserver<O, F>
where
  O: ?Sized + SingleObserver<U>,
  F: Fn(T) -> U + Send + Sync,
{
  fn on_success(&self, value: T) {
    match catch_callback(|| (self.func)(value)) {
      Ok(mapped) => self.observer.on_success(mapped),
      Err(err) => self.observer.on_error(err),
    }
  }
}

impl<T, U, O, F> MaybeObserver<T> for MapObserver<O, F>
where
  O: ?Sized + MaybeObserver<U>,
  F: Fn(T) -> U + Send + Sync,
{
  fn on_success(&self, value: T) {
    match catch_callback(|| (self.func)(value)) {
      Ok(mapped) => self.observer.on_success(mapped),
      Err(err) => self.observer.on_error(err),
    }
  }

  #[inline]
  fn on_complete(&self) { self.observer.on_complete(); }
}

impl<T, U, O, F> Observer<T> for MapObserver<O, F>
where
  O: ?Sized + Observer<U>,
  F: Fn(T) -> U + Send + Sync,
{
  /// A panicking `func` unwinds into the upstream protocol decorator, which
  /// disposes the upstream and fails this observer.
  #[inline]
  fn on_next(&self, value: T) { self.observer.on_next((self.func)(value)); }

  #[inline]
  fn on_complete(&self) { self.observer.on_complete(); }
}

macro_rules! impl_map_op {
  ($kind:ident, $observer:ident) => {
    impl<T: Send + 'static> $kind<T> {
      /// Transform the emitted value with `func`. A panic in `func` fails the
      /// subscription.
      pub fn map<U, F>(&self, func: F) -> $kind<U>
      where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
      {
        let source = self.clone();
        let func = Arc::new(func);
        $kind::<U>::operator("map", move |observer: Arc<dyn $observer<U>>| {
          source.subscribe(Arc::new(MapObserver { observer, func: func.clone() }));
        })
      }
    }
  };
}

impl_map_op!(Single, SingleObserver);
impl_map_op!(Maybe, MaybeObserver);
impl_map_op!(Observable, Observer);

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestObserver;

  #[rxkit_macro::test]
  fn map_single() {
    let observer = TestObserver::<String>::new();
    Single::just(21).map(|v| (v * 2).to_string()).subscribe(observer.clone());
    assert_eq!(observer.values(), vec!["42".to_string()]);
  }

  #[rxkit_macro::test]
  fn panicking_mapper_becomes_error() {
    let observer = TestObserver::<i32>::new();
    Single::just(0).map(|v: i32| 10 / v).subscribe(observer.clone());
    assert!(observer.values().is_empty());
    assert!(matches!(observer.errors()[0], RxError::Panic(_)));
  }

  #[rxkit_macro::test]
  fn map_maybe_passes_completion() {
    let observer = TestObserver::<i32>::new();
    Maybe::<i32>::empty().map(|v| v + 1).subscribe(observer.clone());
    assert_eq!(observer.completions(), 1);
  }

  #[rxkit_macro::test]
  fn map_observable_stops_on_panic() {
    let observer = TestObserver::<i32>::new();
    Observable::from_iter(1..10)
      .map(|v: i32| {
        assert!(v < 3, "item {v} rejected");
        v * 10
      })
      .subscribe(observer.clone());
    assert_eq!(observer.values(), vec![10, 20]);
    assert_eq!(observer.errors().len(), 1);
    assert_eq!(observer.completions(), 0);
  }

  #[rxkit_macro::test]
  fn bench() { do_bench(); }

  bencher::benchmark_group!(do_bench, bench_map);

  fn bench_map(b: &mut bencher::Bencher) { b.iter(map_single); }
}
