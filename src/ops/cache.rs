//! `cache`: subscribe upstream once and replay its outcome to every
//! subscriber.
//!
//! The first subscription triggers the upstream one. Subscribers arriving
//! before the outcome wait in a queue; later ones receive the stored outcome
//! synchronously. Disposing a waiting subscriber only removes it from the
//! queue, the upstream keeps running.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Weak,
};

use parking_lot::Mutex;

use crate::{
  disposable::{Disposable, DisposableRef},
  error::{Result, RxError},
  observer::{BaseObserver, SingleObserver},
  Single,
};

enum Phase<T> {
  Pending(Vec<Arc<CacheSubscriber<T>>>),
  Done(Result<T>),
}

struct CacheShared<T> {
  source: Single<T>,
  started: AtomicBool,
  phase: Mutex<Phase<T>>,
}

impl<T: Clone + Send + 'static> CacheShared<T> {
  fn settle(&self, outcome: Result<T>) {
    let waiting = {
      let mut phase = self.phase.lock();
      match std::mem::replace(&mut *phase, Phase::Done(outcome.clone())) {
        Phase::Pending(waiting) => waiting,
        Phase::Done(previous) => {
          // First outcome wins.
          *phase = Phase::Done(previous);
          return;
        }
      }
    };
    tracing::trace!(subscribers = waiting.len(), "cache settled");
    for subscriber in waiting {
      subscriber.deliver(outcome.clone());
    }
  }
}

/// One downstream subscription; also its disposable handle.
struct CacheSubscriber<T> {
  observer: Arc<dyn SingleObserver<T>>,
  disposed: AtomicBool,
  parent: Weak<CacheShared<T>>,
}

impl<T> CacheSubscriber<T> {
  fn deliver(&self, outcome: Result<T>) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    match outcome {
      Ok(value) => self.observer.on_success(value),
      Err(err) => self.observer.on_error(err),
    }
  }
}

impl<T: Send> Disposable for CacheSubscriber<T> {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    let Some(parent) = self.parent.upgrade() else { return };
    let mut phase = parent.phase.lock();
    if let Phase::Pending(waiting) = &mut *phase {
      waiting.retain(|s| !std::ptr::eq(Arc::as_ptr(s), self));
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

struct CacheObserver<T>(Arc<CacheShared<T>>);

impl<T: Clone + Send + 'static> BaseObserver for CacheObserver<T> {
  /// The cache never cancels upstream.
  fn on_subscribe(&self, _: DisposableRef) {}

  fn on_error(&self, err: RxError) { self.0.settle(Err(err)); }
}

impl<T: Clone + Send + 'static> SingleObserver<T> for CacheObserver<T> {
  fn on_success(&self, value: T) { self.0.settle(Ok(value)); }
}

impl<T: Clone + Send + 'static> Single<T> {
  /// Share one upstream subscription and replay its outcome, success or
  /// error, to every subscriber.
  ///
  /// ```rust
  /// use rxkit::{testing::TestObserver, Single};
  ///
  /// let cached = Single::just("Hello World").cache();
  /// for _ in 0..4 {
  ///   let observer = TestObserver::<&str>::new();
  ///   cached.subscribe(observer.clone());
  ///   assert_eq!(observer.values(), vec!["Hello World"]);
  /// }
  /// ```
  pub fn cache(&self) -> Self {
    let shared = Arc::new(CacheShared {
      source: self.clone(),
      started: AtomicBool::new(false),
      phase: Mutex::new(Phase::Pending(Vec::new())),
    });
    Self::operator("cache", move |observer| {
      let subscriber = Arc::new(CacheSubscriber {
        observer,
        disposed: AtomicBool::new(false),
        parent: Arc::downgrade(&shared),
      });
      subscriber.observer.on_subscribe(subscriber.clone());

      let cached = match &mut *shared.phase.lock() {
        Phase::Pending(waiting) => {
          if !subscriber.is_disposed() {
            waiting.push(subscriber.clone());
          }
          None
        }
        Phase::Done(outcome) => Some(outcome.clone()),
      };
      match cached {
        Some(outcome) => subscriber.deliver(outcome),
        None => {
          if !shared.started.swap(true, Ordering::AcqRel) {
            shared.source.subscribe(Arc::new(CacheObserver(shared.clone())));
          }
        }
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{atomic::AtomicUsize, mpsc};

  use super::*;
  use crate::{emitter::SingleEmitter, testing::TestObserver};

  fn counted<T: Clone + Send + Sync + 'static>(value: T) -> (Arc<AtomicUsize>, Single<T>) {
    let count = Arc::new(AtomicUsize::new(0));
    let c_count = count.clone();
    let single = Single::create(move |emitter| {
      c_count.fetch_add(1, Ordering::SeqCst);
      emitter.on_success(value.clone());
      Ok(())
    });
    (count, single)
  }

  #[rxkit_macro::test]
  fn upstream_subscribed_once() {
    let (count, single) = counted("Hello World");
    let cached = single.cache();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    for _ in 0..4 {
      let observer = TestObserver::<&str>::new();
      cached.subscribe(observer.clone());
      assert_eq!(observer.values(), vec!["Hello World"]);
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[rxkit_macro::test]
  fn errors_are_replayed() {
    let cached = Single::<i32>::error(RxError::msg("boom")).cache();
    for _ in 0..2 {
      let observer = TestObserver::<i32>::new();
      cached.subscribe(observer.clone());
      assert_eq!(observer.errors()[0].to_string(), "boom");
    }
  }

  #[rxkit_macro::test]
  fn early_subscribers_wait_for_outcome() {
    let (tx, rx) = mpsc::channel::<SingleEmitter<i32>>();
    let tx = Mutex::new(tx);
    let cached = Single::create(move |emitter| {
      let _ = tx.lock().send(emitter);
      Ok(())
    })
    .cache();

    let first = TestObserver::<i32>::new();
    let second = TestObserver::<i32>::new();
    let leaving = TestObserver::<i32>::new();
    cached.subscribe(first.clone());
    cached.subscribe(second.clone());
    cached.subscribe(leaving.clone());
    leaving.dispose();
    assert!(first.values().is_empty());

    let emitter = rx.try_recv().expect("upstream subscribed");
    assert!(rx.try_recv().is_err());
    emitter.on_success(5);

    assert_eq!(first.values(), vec![5]);
    assert_eq!(second.values(), vec![5]);
    assert!(leaving.values().is_empty());
  }

  #[rxkit_macro::test]
  fn dispose_leaves_queue_and_outlives_cache() {
    let (tx, rx) = mpsc::channel::<SingleEmitter<i32>>();
    let tx = Mutex::new(tx);
    let cached = Single::create(move |emitter| {
      let _ = tx.lock().send(emitter);
      Ok(())
    })
    .cache();

    let staying = TestObserver::<i32>::new();
    let leaving = TestObserver::<i32>::new();
    cached.subscribe(staying.clone());
    cached.subscribe(leaving.clone());
    leaving.dispose();
    assert!(leaving.is_disposed());

    let emitter = rx.try_recv().expect("upstream subscribed");
    drop(cached);
    emitter.on_success(3);
    assert_eq!(staying.values(), vec![3]);
    assert!(leaving.values().is_empty());

    // Disposing after the outcome arrived is a no-op.
    staying.dispose();
    assert_eq!(staying.values(), vec![3]);
  }

  #[rxkit_macro::test]
  fn concurrent_first_subscribers() {
    let (count, single) = counted(9);
    let cached = single.cache();
    let observers: Vec<_> = (0..8).map(|_| TestObserver::<i32>::new()).collect();
    std::thread::scope(|scope| {
      for observer in &observers {
        let cached = cached.clone();
        let observer = observer.clone();
        scope.spawn(move || cached.subscribe(observer));
      }
    });
    assert_eq!(count.load(Ordering::SeqCst), 1);
    for observer in &observers {
      assert_eq!(observer.values(), vec![9]);
    }
  }

  #[rxkit_macro::test]
  fn bench() { do_bench(); }

  bencher::benchmark_group!(do_bench, bench_cache);

  fn bench_cache(b: &mut bencher::Bencher) { b.iter(upstream_subscribed_once); }
}
