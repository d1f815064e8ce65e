//! `do_finally`: run an action exactly once per subscription, after the
//! terminal signal went downstream or after the subscription was disposed,
//! whichever comes first.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  disposable::{Disposable, DisposableRef, SerialDisposable},
  error::{catch_callback, RxError},
  observer::{BaseObserver, CompletableObserver, MaybeObserver, Observer, SingleObserver},
  plugins, Completable, Maybe, Observable, Single,
};

/// Per-subscription state; handed downstream as the subscription handle.
struct FinallyState<F> {
  ran: AtomicBool,
  action: Arc<F>,
  upstream: SerialDisposable,
}

impl<F: Fn() + Send + Sync> FinallyState<F> {
  fn run(&self) {
    if self.ran.swap(true, Ordering::AcqRel) {
      return;
    }
    if let Err(err) = catch_callback(|| (self.action)()) {
      plugins::on_error(err);
    }
  }

  fn finish(&self) {
    self.upstream.detach();
    self.run();
  }
}

impl<F: Fn() + Send + Sync> Disposable for FinallyState<F> {
  fn dispose(&self) {
    self.upstream.dispose();
    self.run();
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.upstream.is_disposed() }
}

pub struct FinallyObserver<O: ?Sized, F> {
  observer: Arc<O>,
  state: Arc<FinallyState<F>>,
}

impl<O, F> BaseObserver for FinallyObserver<O, F>
where
  O: ?Sized + BaseObserver,
  F: Fn() + Send + Sync + 'static,
{
  fn on_subscribe(&self, d: DisposableRef) {
    self.state.upstream.set(Some(d));
    self.observer.on_subscribe(self.state.clone());
  }

  fn on_error(&self, err: RxError) {
    self.observer.on_error(err);
    self.state.finish();
  }
}

impl<O, F> CompletableObserver for FinallyObserver<O, F>
where
  O: ?Sized + CompletableObserver,
  F: Fn() + Send + Sync + 'static,
{
  fn on_complete(&self) {
    self.observer.on_complete();
    self.state.finish();
  }
}

impl<T, O, F> SingleObserver<T> for FinallyObserver<O, F>
where
  O: ?Sized + SingleObserver<T>,
  F: Fn() + Send + Sync + 'static,
{
  fn on_success(&self, value: T) {
    self.observer.on_success(value);
    self.state.finish();
  }
}

impl<T, O, F> MaybeObserver<T> for FinallyObserver<O, F>
where
  O: ?Sized + MaybeObserver<T>,
  F: Fn() + Send + Sync + 'static,
{
  fn on_success(&self, value: T) {
    self.observer.on_success(value);
    self.state.finish();
  }

  fn on_complete(&self) {
    self.observer.on_complete();
    self.state.finish();
  }
}

impl<T, O, F> Observer<T> for FinallyObserver<O, F>
where
  O: ?Sized + Observer<T>,
  F: Fn() + Send + Sync + 'static,
{
  #[inline]
  fn on_next(&self, value: T) { self.observer.on_next(value); }

  fn on_complete(&self) {
    self.observer.on_complete();
    self.state.finish();
  }
}

macro_rules! impl_finally_op {
  ($kind:ty, $observer:ty, [$($generics:tt)*]) => {
    impl<$($generics)*> $kind {
      /// Run `action` once per subscription, after the terminal signal or
      /// after disposal. A panic in `action` goes to the fallback sink.
      pub fn do_finally<F>(&self, action: F) -> Self
      where
        F: Fn() + Send + Sync + 'static,
      {
        let source = self.clone();
        let action = Arc::new(action);
        Self::operator("do_finally", move |observer: Arc<$observer>| {
          let state = Arc::new(FinallyState {
            ran: AtomicBool::new(false),
            action: action.clone(),
            upstream: SerialDisposable::new(),
          });
          source.subscribe(Arc::new(FinallyObserver { observer, state }));
        })
      }
    }
  };
}

impl_finally_op!(Completable, dyn CompletableObserver, []);
impl_finally_op!(Single<T>, dyn SingleObserver<T>, [T: Send + 'static]);
impl_finally_op!(Maybe<T>, dyn MaybeObserver<T>, [T: Send + 'static]);
impl_finally_op!(Observable<T>, dyn Observer<T>, [T: Send + 'static]);

#[cfg(test)]
mod tests {
  use std::sync::{atomic::AtomicUsize, Barrier};

  use super::*;
  use crate::testing::TestObserver;

  fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c_count = count.clone();
    (count, move || {
      c_count.fetch_add(1, Ordering::SeqCst);
    })
  }

  #[rxkit_macro::test]
  fn runs_after_terminal() {
    let (count, action) = counter();
    let order = Arc::new(parking_lot::Mutex::new(vec![]));
    let (c_order1, c_order2) = (order.clone(), order.clone());
    Single::just(1)
      .do_finally(move || {
        action();
        c_order1.lock().push("finally");
      })
      .subscribe_by(move |_| c_order2.lock().push("success"), |_| {});
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(*order.lock(), vec!["success", "finally"]);
  }

  #[rxkit_macro::test]
  fn runs_on_dispose_for_every_kind() {
    let (count, action) = counter();
    let action = Arc::new(action);
    let c1 = action.clone();
    let c2 = action.clone();
    let c3 = action.clone();
    let handles = [
      Single::<i32>::never().do_finally(move || c1()).subscribe_by(|_| {}, |_| {}),
      Maybe::<i32>::never().do_finally(move || c2()).subscribe_by(|_| {}, |_| {}, || {}),
      Completable::never().do_finally(move || c3()).subscribe_by(|| {}, |_| {}),
      Observable::<i32>::never().do_finally(move || action()).subscribe_by(|_| {}, |_| {}, || {}),
    ];
    assert_eq!(count.load(Ordering::SeqCst), 0);
    for h in &handles {
      h.dispose();
      h.dispose();
    }
    assert_eq!(count.load(Ordering::SeqCst), 4);
  }

  #[rxkit_macro::test]
  fn once_under_terminal_dispose_race() {
    for _ in 0..64 {
      let (count, action) = counter();
      let barrier = Arc::new(Barrier::new(2));
      let c_barrier = barrier.clone();
      let single = Single::<i32>::create(move |emitter| {
        let c_barrier = c_barrier.clone();
        std::thread::spawn(move || {
          c_barrier.wait();
          emitter.on_success(1);
        });
        Ok(())
      })
      .do_finally(action);

      let observer = TestObserver::<i32>::new();
      single.subscribe(observer.clone());
      barrier.wait();
      observer.dispose();
      while count.load(Ordering::SeqCst) == 0 {
        std::thread::yield_now();
      }
      std::thread::sleep(std::time::Duration::from_millis(1));
      assert_eq!(count.load(Ordering::SeqCst), 1);
    }
  }
}
