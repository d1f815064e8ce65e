//! `equals`: subscribe to two Singles and emit whether their values match.
//!
//! Both are subscribed in order, sharing one [`CompositeDisposable`] that is
//! also the downstream handle. The first error wins and disposes the other
//! side; a later error goes to the fallback sink.

use std::sync::{
  atomic::{AtomicBool, AtomicUsize, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  disposable::{CompositeDisposable, Disposable, DisposableRef},
  error::{catch_callback, RxError},
  observer::{BaseObserver, SingleObserver},
  plugins, Single,
};

struct EqualsState<T, C> {
  values: Mutex<[Option<T>; 2]>,
  remaining: AtomicUsize,
  done: AtomicBool,
  set: Arc<CompositeDisposable>,
  observer: Arc<dyn SingleObserver<bool>>,
  comparer: Arc<C>,
}

struct EqualsObserver<T, C> {
  index: usize,
  state: Arc<EqualsState<T, C>>,
}

impl<T, C> BaseObserver for EqualsObserver<T, C>
where
  T: Send,
  C: Send + Sync,
{
  #[inline]
  fn on_subscribe(&self, d: DisposableRef) { self.state.set.add(d); }

  fn on_error(&self, err: RxError) {
    let state = &self.state;
    if state.done.swap(true, Ordering::AcqRel) {
      plugins::on_error(err);
      return;
    }
    state.set.dispose();
    state.observer.on_error(err);
  }
}

impl<T, C> SingleObserver<T> for EqualsObserver<T, C>
where
  T: Send,
  C: Fn(&T, &T) -> bool + Send + Sync,
{
  fn on_success(&self, value: T) {
    let state = &self.state;
    state.values.lock()[self.index] = Some(value);
    if state.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
      return;
    }
    let pair = {
      let mut values = state.values.lock();
      (values[0].take(), values[1].take())
    };
    let (Some(a), Some(b)) = pair else { return };
    if state.done.swap(true, Ordering::AcqRel) {
      return;
    }
    match catch_callback(|| (state.comparer)(&a, &b)) {
      Ok(same) => state.observer.on_success(same),
      Err(err) => state.observer.on_error(err),
    }
  }
}

impl<T: Send + 'static> Single<T> {
  /// Emit whether `first` and `second` succeed with equal values.
  ///
  /// ```rust
  /// use rxkit::{testing::TestObserver, Single};
  ///
  /// let observer = TestObserver::<bool>::new();
  /// Single::equals(Single::just(1), Single::just(1)).subscribe(observer.clone());
  /// assert_eq!(observer.values(), vec![true]);
  /// ```
  pub fn equals(first: Single<T>, second: Single<T>) -> Single<bool>
  where
    T: PartialEq,
  {
    Self::equals_by(first, second, |a: &T, b: &T| a == b)
  }

  /// Emit `comparer(first_value, second_value)`.
  pub fn equals_by<C>(first: Single<T>, second: Single<T>, comparer: C) -> Single<bool>
  where
    C: Fn(&T, &T) -> bool + Send + Sync + 'static,
  {
    let comparer = Arc::new(comparer);
    Single::<bool>::factory("equals", move |observer| {
      let set = Arc::new(CompositeDisposable::new());
      observer.on_subscribe(set.clone());
      let state = Arc::new(EqualsState {
        values: Mutex::new([None, None]),
        remaining: AtomicUsize::new(2),
        done: AtomicBool::new(false),
        set,
        observer,
        comparer: comparer.clone(),
      });
      for (index, source) in [&first, &second].into_iter().enumerate() {
        if state.set.is_disposed() {
          break;
        }
        source.subscribe(Arc::new(EqualsObserver { index, state: state.clone() }));
      }
    })
  }
}
