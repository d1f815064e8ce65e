//! A recording observer for tests.
//!
//! [`TestObserver`] implements every observer trait, so the same recorder
//! can be subscribed to any kind:
//!
//! ```
//! use rxkit::{testing::TestObserver, Single};
//!
//! let observer = TestObserver::<i32>::new();
//! Single::just(42).subscribe(observer.clone());
//! assert_eq!(observer.values(), vec![42]);
//! ```

use std::{fmt::Debug, sync::Arc};

use parking_lot::Mutex;

use crate::{
  disposable::{Disposable, DisposableRef, SerialDisposable},
  error::RxError,
  observer::{BaseObserver, CompletableObserver, MaybeObserver, Observer, SingleObserver},
};

/// One recorded signal.
#[derive(Debug, Clone)]
pub enum Event<T> {
  Subscribe,
  Next(T),
  Success(T),
  Error(RxError),
  Complete,
}

/// Errors compare by their message.
impl<T: PartialEq> PartialEq for Event<T> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Event::Subscribe, Event::Subscribe) | (Event::Complete, Event::Complete) => true,
      (Event::Next(a), Event::Next(b)) | (Event::Success(a), Event::Success(b)) => a == b,
      (Event::Error(a), Event::Error(b)) => a.to_string() == b.to_string(),
      _ => false,
    }
  }
}

type Hook<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct TestObserver<T> {
  events: Mutex<Vec<Event<T>>>,
  upstream: SerialDisposable,
  on_each: Mutex<Option<Hook<T>>>,
}

impl<T: Clone + Send + 'static> TestObserver<T> {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      events: Mutex::new(Vec::new()),
      upstream: SerialDisposable::new(),
      on_each: Mutex::new(None),
    })
  }

  /// Call `f` with every item after it is recorded.
  pub fn on_each(&self, f: impl Fn(T) + Send + Sync + 'static) {
    *self.on_each.lock() = Some(Arc::new(f));
  }

  pub fn events(&self) -> Vec<Event<T>> { self.events.lock().clone() }

  /// Items and success values, in arrival order.
  pub fn values(&self) -> Vec<T> {
    let events = self.events.lock();
    events
      .iter()
      .filter_map(|e| match e {
        Event::Next(v) | Event::Success(v) => Some(v.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn errors(&self) -> Vec<RxError> {
    let events = self.events.lock();
    events
      .iter()
      .filter_map(|e| match e {
        Event::Error(err) => Some(err.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn completions(&self) -> usize { self.count(|e| matches!(e, Event::Complete)) }

  pub fn subscriptions(&self) -> usize { self.count(|e| matches!(e, Event::Subscribe)) }

  /// Whether a terminal signal was recorded.
  pub fn is_terminated(&self) -> bool {
    self.count(|e| matches!(e, Event::Success(_) | Event::Error(_) | Event::Complete)) > 0
  }

  /// The handle received by the first `on_subscribe`.
  pub fn upstream(&self) -> Option<DisposableRef> { self.upstream.get() }

  fn count(&self, pred: impl Fn(&Event<T>) -> bool) -> usize {
    self.events.lock().iter().filter(|e| pred(e)).count()
  }

  fn record(&self, event: Event<T>) { self.events.lock().push(event); }
}

impl<T: Debug> Debug for TestObserver<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TestObserver").field("events", &*self.events.lock()).finish()
  }
}

impl<T: Clone + Send + 'static> BaseObserver for TestObserver<T> {
  fn on_subscribe(&self, d: DisposableRef) {
    self.record(Event::Subscribe);
    // A recorder keeps the first handle; protocol checks happen upstream.
    let _ = self.upstream.set_once(d);
  }

  fn on_error(&self, err: RxError) { self.record(Event::Error(err)); }
}

impl<T: Clone + Send + 'static> CompletableObserver for TestObserver<T> {
  fn on_complete(&self) { self.record(Event::Complete); }
}

impl<T: Clone + Send + 'static> SingleObserver<T> for TestObserver<T> {
  fn on_success(&self, value: T) { self.record(Event::Success(value)); }
}

impl<T: Clone + Send + 'static> MaybeObserver<T> for TestObserver<T> {
  fn on_success(&self, value: T) { self.record(Event::Success(value)); }

  fn on_complete(&self) { self.record(Event::Complete); }
}

impl<T: Clone + Send + 'static> Observer<T> for TestObserver<T> {
  fn on_next(&self, value: T) {
    self.record(Event::Next(value.clone()));
    let hook = self.on_each.lock().clone();
    if let Some(hook) = hook {
      hook(value);
    }
  }

  fn on_complete(&self) { self.record(Event::Complete); }
}

impl<T: Send> Disposable for TestObserver<T> {
  fn dispose(&self) { self.upstream.dispose(); }

  fn is_disposed(&self) -> bool { self.upstream.is_disposed() }
}
