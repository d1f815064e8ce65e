//! The protocol decorator every `subscribe` wraps around its observer.
//!
//! [`SafeObserver`] runs a three state machine, `unsubscribed -> active ->
//! terminated`, and only forwards the signals that are legal in the current
//! state. Everything else is dropped; dropped errors are re-routed to the
//! fallback sink and protocol violations are reported there as
//! [`RxError::ProtocolViolation`].

use std::sync::{
  atomic::{AtomicU8, Ordering},
  Arc, Weak,
};

use parking_lot::Mutex;

use super::{BaseObserver, CompletableObserver, MaybeObserver, Observer, SingleObserver};
use crate::{
  disposable::{Disposable, DisposableRef},
  error::{catch_callback, RxError},
  plugins,
  source::{ObserverKind, SourceKind},
};

const UNSUBSCRIBED: u8 = 0;
const ACTIVE: u8 = 1;
const TERMINATED: u8 = 2;

struct ProtocolGuard(AtomicU8);

impl ProtocolGuard {
  fn new() -> Self { Self(AtomicU8::new(UNSUBSCRIBED)) }

  /// `true` for the first `on_subscribe` only.
  #[inline]
  fn subscribe(&self) -> bool {
    self.0.compare_exchange(UNSUBSCRIBED, ACTIVE, Ordering::AcqRel, Ordering::Acquire).is_ok()
  }

  /// Moves `active -> terminated`; on failure returns the state observed.
  #[inline]
  fn terminate(&self) -> Result<(), u8> {
    self.0.compare_exchange(ACTIVE, TERMINATED, Ordering::AcqRel, Ordering::Acquire).map(|_| ())
  }

  #[inline]
  fn state(&self) -> u8 { self.0.load(Ordering::Acquire) }
}

pub(crate) fn report_violation(msg: String) {
  tracing::debug!(violation = %msg, "protocol violation");
  plugins::on_error(RxError::protocol_violation(msg));
}

fn deliver(f: impl FnOnce()) {
  if let Err(err) = catch_callback(f) {
    plugins::on_error(err);
  }
}

struct SafeObserver<O: ?Sized> {
  guard: ProtocolGuard,
  // Only consulted when `on_next` panics; weak so that the producer side
  // keeps ownership of its own resources.
  upstream: Mutex<Option<Weak<dyn Disposable>>>,
  inner: Arc<O>,
}

impl<O: ?Sized + BaseObserver> SafeObserver<O> {
  fn new(inner: Arc<O>) -> Self {
    Self { guard: ProtocolGuard::new(), upstream: Mutex::new(None), inner }
  }

  fn begin_terminal(&self, signal: &'static str) -> bool {
    match self.guard.terminate() {
      Ok(()) => true,
      Err(UNSUBSCRIBED) => {
        report_violation(format!("`{signal}` signalled before `on_subscribe`"));
        false
      }
      Err(_) => {
        tracing::debug!(signal, "signal after terminal dropped");
        false
      }
    }
  }

  fn dispose_upstream(&self) {
    let upstream = self.upstream.lock().take().and_then(|weak| weak.upgrade());
    if let Some(upstream) = upstream {
      upstream.dispose();
    }
  }
}

impl<O: ?Sized + BaseObserver> BaseObserver for SafeObserver<O> {
  fn on_subscribe(&self, d: DisposableRef) {
    if !self.guard.subscribe() {
      d.dispose();
      report_violation("`on_subscribe` called more than once".to_string());
      return;
    }
    *self.upstream.lock() = Some(Arc::downgrade(&d));
    let c_d = d.clone();
    if let Err(err) = catch_callback(|| self.inner.on_subscribe(c_d)) {
      d.dispose();
      if self.begin_terminal("on_error") {
        deliver(|| self.inner.on_error(err));
      }
    }
  }

  fn on_error(&self, err: RxError) {
    if self.begin_terminal("on_error") {
      deliver(|| self.inner.on_error(err));
    } else {
      plugins::on_error(err);
    }
  }
}

impl<O: ?Sized + CompletableObserver> CompletableObserver for SafeObserver<O> {
  fn on_complete(&self) {
    if self.begin_terminal("on_complete") {
      deliver(|| self.inner.on_complete());
    }
  }
}

impl<T, O: ?Sized + SingleObserver<T>> SingleObserver<T> for SafeObserver<O> {
  fn on_success(&self, value: T) {
    if self.begin_terminal("on_success") {
      deliver(|| self.inner.on_success(value));
    }
  }
}

impl<T, O: ?Sized + MaybeObserver<T>> MaybeObserver<T> for SafeObserver<O> {
  fn on_success(&self, value: T) {
    if self.begin_terminal("on_success") {
      deliver(|| self.inner.on_success(value));
    }
  }

  fn on_complete(&self) {
    if self.begin_terminal("on_complete") {
      deliver(|| self.inner.on_complete());
    }
  }
}

impl<T, O: ?Sized + Observer<T>> Observer<T> for SafeObserver<O> {
  fn on_next(&self, value: T) {
    match self.guard.state() {
      ACTIVE => {}
      UNSUBSCRIBED => {
        return report_violation("`on_next` signalled before `on_subscribe`".to_string())
      }
      _ => return,
    }
    // A panicking consumer counts as a consumer that disposed and failed.
    if let Err(err) = catch_callback(|| self.inner.on_next(value)) {
      if self.guard.terminate().is_ok() {
        self.dispose_upstream();
        deliver(|| self.inner.on_error(err));
      } else {
        plugins::on_error(err);
      }
    }
  }

  fn on_complete(&self) {
    if self.begin_terminal("on_complete") {
      deliver(|| self.inner.on_complete());
    }
  }
}

// ============================================================================
// ObserverKind for each observer trait object
// ============================================================================

impl ObserverKind for dyn CompletableObserver {
  const KIND: SourceKind = SourceKind::Completable;

  fn protect(observer: Arc<Self>) -> Arc<Self> { Arc::new(SafeObserver::new(observer)) }
}

impl<T: 'static> ObserverKind for dyn MaybeObserver<T> {
  const KIND: SourceKind = SourceKind::Maybe;

  fn protect(observer: Arc<Self>) -> Arc<Self> { Arc::new(SafeObserver::new(observer)) }
}

impl<T: 'static> ObserverKind for dyn SingleObserver<T> {
  const KIND: SourceKind = SourceKind::Single;

  fn protect(observer: Arc<Self>) -> Arc<Self> { Arc::new(SafeObserver::new(observer)) }
}

impl<T: 'static> ObserverKind for dyn Observer<T> {
  const KIND: SourceKind = SourceKind::Observable;

  fn protect(observer: Arc<Self>) -> Arc<Self> { Arc::new(SafeObserver::new(observer)) }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use super::*;
  use crate::{
    disposable::{empty, BooleanDisposable},
    plugins::test_util::capture_errors,
    testing::{Event, TestObserver},
    Observable, Single,
  };

  #[rxkit_macro::test]
  fn second_subscription_is_rejected() {
    let first: DisposableRef = Arc::new(BooleanDisposable::new());
    let second = empty();
    let (c_first, c_second) = (first.clone(), second.clone());
    let single = Single::<i32>::new(move |observer| {
      observer.on_subscribe(c_first.clone());
      observer.on_subscribe(c_second.clone());
      observer.on_success(1);
    });
    let observer = TestObserver::<i32>::new();
    let ((), errors) = capture_errors(|| single.subscribe(observer.clone()));

    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_protocol_violation());
    assert!(second.is_disposed());
    assert!(!first.is_disposed());
    assert_eq!(observer.subscriptions(), 1);
    assert_eq!(observer.values(), vec![1]);
  }

  #[rxkit_macro::test]
  fn only_first_terminal_is_delivered() {
    let single = Single::<i32>::new(|observer| {
      observer.on_subscribe(empty());
      observer.on_success(1);
      observer.on_success(2);
      observer.on_error(RxError::msg("late"));
    });
    let observer = TestObserver::<i32>::new();
    let ((), errors) = capture_errors(|| single.subscribe(observer.clone()));

    assert_eq!(observer.values(), vec![1]);
    assert!(observer.errors().is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "late");
  }

  #[rxkit_macro::test]
  fn signals_before_subscribe_are_violations() {
    let single = Single::<i32>::new(|observer| {
      observer.on_error(RxError::msg("early"));
      observer.on_subscribe(empty());
      observer.on_success(3);
    });
    let observer = TestObserver::<i32>::new();
    let ((), errors) = capture_errors(|| single.subscribe(observer.clone()));

    assert_eq!(errors.len(), 2);
    assert!(errors[0].is_protocol_violation());
    assert_eq!(errors[1].to_string(), "early");
    assert_eq!(observer.values(), vec![3]);
  }

  #[rxkit_macro::test]
  fn panicking_terminal_handler_goes_to_sink() {
    struct Exploding;
    impl BaseObserver for Exploding {
      fn on_subscribe(&self, _: DisposableRef) {}
      fn on_error(&self, _: RxError) {}
    }
    impl SingleObserver<i32> for Exploding {
      fn on_success(&self, _: i32) { panic!("handler failed") }
    }

    let single = Single::<i32>::new(|observer| {
      observer.on_subscribe(empty());
      observer.on_success(1);
    });
    let ((), errors) = capture_errors(|| single.subscribe(Arc::new(Exploding)));
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], RxError::Panic(m) if m == "handler failed"));
  }

  #[rxkit_macro::test]
  fn panicking_on_next_disposes_and_errors() {
    struct Picky {
      seen: AtomicUsize,
      errors: Mutex<Vec<RxError>>,
    }
    impl BaseObserver for Picky {
      fn on_subscribe(&self, _: DisposableRef) {}
      fn on_error(&self, err: RxError) { self.errors.lock().push(err) }
    }
    impl Observer<i32> for Picky {
      fn on_next(&self, value: i32) {
        self.seen.fetch_add(1, Ordering::SeqCst);
        assert!(value < 2, "too big");
      }
      fn on_complete(&self) {}
    }

    let upstream: DisposableRef = Arc::new(BooleanDisposable::new());
    let c_upstream = upstream.clone();
    let source = Observable::<i32>::new(move |observer| {
      observer.on_subscribe(c_upstream.clone());
      for v in 0..5 {
        observer.on_next(v);
      }
      observer.on_complete();
    });
    let picky = Arc::new(Picky { seen: AtomicUsize::new(0), errors: Mutex::new(vec![]) });
    source.subscribe(picky.clone());

    assert!(upstream.is_disposed());
    assert_eq!(picky.seen.load(Ordering::SeqCst), 3);
    let errors = picky.errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], RxError::Panic(_)));
  }

  #[rxkit_macro::test]
  fn completion_after_completion_is_dropped() {
    let source = Observable::<i32>::new(|observer| {
      observer.on_subscribe(empty());
      observer.on_next(1);
      observer.on_complete();
      observer.on_next(2);
      observer.on_complete();
    });
    let observer = TestObserver::<i32>::new();
    let ((), errors) = capture_errors(|| source.subscribe(observer.clone()));
    assert!(errors.is_empty());
    assert_eq!(observer.events(), vec![Event::Subscribe, Event::Next(1), Event::Complete]);
  }
}
