//! `amb`: race several Singles and relay whichever terminates first.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  disposable::{CompositeDisposable, Disposable, DisposableRef},
  error::RxError,
  observer::{BaseObserver, SingleObserver},
  plugins, Single,
};

struct AmbObserver<T> {
  observer: Arc<dyn SingleObserver<T>>,
  set: Arc<CompositeDisposable>,
  winner: Arc<AtomicBool>,
}

impl<T> AmbObserver<T> {
  /// `true` for the first terminal signal across all contenders; the others
  /// are cancelled before it is forwarded.
  fn win(&self) -> bool {
    if self.winner.swap(true, Ordering::AcqRel) {
      return false;
    }
    self.set.dispose();
    true
  }
}

impl<T: Send + 'static> BaseObserver for AmbObserver<T> {
  #[inline]
  fn on_subscribe(&self, d: DisposableRef) { self.set.add(d); }

  fn on_error(&self, err: RxError) {
    if self.win() {
      self.observer.on_error(err);
    } else {
      plugins::on_error(err);
    }
  }
}

impl<T: Send + 'static> SingleObserver<T> for AmbObserver<T> {
  fn on_success(&self, value: T) {
    if self.win() {
      self.observer.on_success(value);
    }
  }
}

impl<T: Send + 'static> Single<T> {
  /// Subscribe to `sources` in order and relay the first terminal signal,
  /// disposing every other contender. Sources not yet subscribed when a
  /// winner emerges are skipped. An empty list fails with
  /// [`RxError::NoSuchElement`].
  ///
  /// ```rust
  /// use rxkit::{testing::TestObserver, Single};
  ///
  /// let raced = Single::amb([Single::just("Hello"), Single::just("World")]);
  /// let observer = TestObserver::<&str>::new();
  /// raced.subscribe(observer.clone());
  /// assert_eq!(observer.values(), vec!["Hello"]);
  /// ```
  pub fn amb<I>(sources: I) -> Self
  where
    I: IntoIterator<Item = Single<T>>,
  {
    let sources: Vec<Single<T>> = sources.into_iter().collect();
    Self::factory("amb", move |observer| {
      let set = Arc::new(CompositeDisposable::new());
      observer.on_subscribe(set.clone());
      if sources.is_empty() {
        observer.on_error(RxError::NoSuchElement);
        return;
      }
      let winner = Arc::new(AtomicBool::new(false));
      for source in &sources {
        if set.is_disposed() {
          break;
        }
        source.subscribe(Arc::new(AmbObserver {
          observer: observer.clone(),
          set: set.clone(),
          winner: winner.clone(),
        }));
      }
    })
  }

  /// Race this Single against `other`.
  pub fn amb_with(&self, other: &Single<T>) -> Self { Self::amb([self.clone(), other.clone()]) }
}
