use std::sync::Arc;

use crate::{
  disposable::DisposableRef,
  error::{catch_callback, RxError},
  observer::{BaseObserver, SingleObserver},
  Single,
};

pub struct ContainsObserver<T, C> {
  observer: Arc<dyn SingleObserver<bool>>,
  target: Arc<T>,
  comparer: Arc<C>,
}

impl<T, C> BaseObserver for ContainsObserver<T, C>
where
  T: Send + Sync,
  C: Send + Sync,
{
  #[inline]
  fn on_subscribe(&self, d: DisposableRef) { self.observer.on_subscribe(d); }

  #[inline]
  fn on_error(&self, err: RxError) { self.observer.on_error(err); }
}

impl<T, C> SingleObserver<T> for ContainsObserver<T, C>
where
  T: Send + Sync,
  C: Fn(&T, &T) -> bool + Send + Sync,
{
  fn on_success(&self, value: T) {
    match catch_callback(|| (self.comparer)(&value, &self.target)) {
      Ok(found) => self.observer.on_success(found),
      Err(err) => self.observer.on_error(err),
    }
  }
}

impl<T: Send + Sync + 'static> Single<T> {
  /// Emit whether the success value equals `value`.
  pub fn contains(&self, value: T) -> Single<bool>
  where
    T: PartialEq,
  {
    self.contains_by(value, |a: &T, b: &T| a == b)
  }

  /// Emit `comparer(success_value, &value)`. A panicking comparer fails the
  /// subscription.
  pub fn contains_by<C>(&self, value: T, comparer: C) -> Single<bool>
  where
    C: Fn(&T, &T) -> bool + Send + Sync + 'static,
  {
    let source = self.clone();
    let target = Arc::new(value);
    let comparer = Arc::new(comparer);
    Single::<bool>::operator("contains", move |observer| {
      source.subscribe(Arc::new(ContainsObserver {
        observer,
        target: target.clone(),
        comparer: comparer.clone(),
      }));
    })
  }
}
