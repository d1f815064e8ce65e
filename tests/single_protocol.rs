//! End to end behavior of the reactive core through its public API.

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Barrier,
};

use parking_lot::Mutex;
use rxkit::{disposable, plugins, prelude::*, testing::TestObserver};

/// Run `f` with this thread's fallback sink redirected into a vector.
fn capture_errors<R>(f: impl FnOnce() -> R) -> (R, Vec<RxError>) {
  let sink = Arc::new(Mutex::new(Vec::new()));
  let c_sink = sink.clone();
  let r = plugins::with_error_handler(Arc::new(move |e: RxError| c_sink.lock().push(e)), f);
  let errors = std::mem::take(&mut *sink.lock());
  (r, errors)
}

fn counting_disposable() -> (Arc<AtomicUsize>, DisposableRef) {
  let count = Arc::new(AtomicUsize::new(0));
  let c_count = count.clone();
  (count, disposable::from_fn(move || {
    c_count.fetch_add(1, Ordering::SeqCst);
  }))
}

#[rxkit_macro::test]
fn dispose_releases_once() {
  let (count, d) = counting_disposable();
  for _ in 0..5 {
    d.dispose();
    assert!(d.is_disposed());
  }
  assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[rxkit_macro::test]
fn composite_rejects_after_dispose() {
  let composite = CompositeDisposable::new();
  composite.dispose();
  let (count, d) = counting_disposable();
  assert!(!composite.add(d.clone()));
  assert!(d.is_disposed());
  assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[rxkit_macro::test]
fn clear_races_with_add() {
  let composite = Arc::new(CompositeDisposable::new());
  let members: Vec<_> = (0..3).map(|_| counting_disposable()).collect();
  for (_, d) in &members {
    composite.add(d.clone());
  }

  let late: Vec<_> = (0..64).map(|_| counting_disposable()).collect();
  std::thread::scope(|scope| {
    let adder = composite.clone();
    let late = &late;
    scope.spawn(move || {
      for (_, d) in late {
        adder.add(d.clone());
      }
    });
    composite.clear();
  });
  composite.clear();

  for (count, _) in members.iter().chain(late.iter()) {
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }
  assert!(composite.is_empty());
}

#[rxkit_macro::test]
fn concurrent_emitter_terminals() {
  for _ in 0..64 {
    let (tx, rx) = std::sync::mpsc::channel();
    let tx = Mutex::new(tx);
    let single = Single::<&str>::create(move |emitter| {
      let _ = tx.lock().send(emitter);
      Ok(())
    });
    let observer = TestObserver::<&str>::new();
    single.subscribe(observer.clone());
    let emitter = rx.recv().expect("subscribed");

    let barrier = Arc::new(Barrier::new(2));
    let sunk = std::thread::scope(|scope| {
      let racers = [
        {
          let (emitter, barrier) = (emitter.clone(), barrier.clone());
          scope.spawn(move || {
            capture_errors(|| {
              barrier.wait();
              emitter.on_success("A");
            })
            .1
          })
        },
        {
          let (emitter, barrier) = (emitter.clone(), barrier.clone());
          scope.spawn(move || {
            capture_errors(|| {
              barrier.wait();
              emitter.on_error(RxError::msg("B"));
            })
            .1
          })
        },
      ];
      racers.into_iter().flat_map(|h| h.join().expect("racer")).collect::<Vec<_>>()
    });

    let delivered = observer.values().len() + observer.errors().len();
    assert_eq!(delivered, 1);
    if observer.values().is_empty() {
      assert!(sunk.is_empty());
    } else {
      assert_eq!(sunk.len(), 1);
      assert_eq!(sunk[0].to_string(), "B");
    }
  }
}

#[rxkit_macro::test]
fn cache_shares_one_upstream() {
  let subscriptions = Arc::new(AtomicUsize::new(0));
  let c_subscriptions = subscriptions.clone();
  let cached = Single::create(move |emitter| {
    c_subscriptions.fetch_add(1, Ordering::SeqCst);
    emitter.on_success("Hello World");
    Ok(())
  })
  .cache();

  for _ in 0..4 {
    let observer = TestObserver::<&str>::new();
    cached.subscribe(observer.clone());
    assert_eq!(observer.values(), vec!["Hello World"]);
  }
  assert_eq!(subscriptions.load(Ordering::SeqCst), 1);
}

#[rxkit_macro::test]
fn amb_relays_exactly_one() {
  let a = Single::create(|emitter| {
    emitter.on_success("Hello");
    Ok(())
  });
  let b = Single::create(|emitter| {
    emitter.on_error(RxError::msg("World"));
    Ok(())
  });
  let observer = TestObserver::<&str>::new();
  let ((), sunk) = capture_errors(|| Single::amb([a, b]).subscribe(observer.clone()));

  assert_eq!(observer.values().len() + observer.errors().len(), 1);
  assert_eq!(observer.values(), vec!["Hello"]);
  assert!(sunk.is_empty());
}

#[rxkit_macro::test]
fn contains_with_comparer() {
  let even = |value: u32| {
    let observer = TestObserver::<bool>::new();
    Single::just(value).contains_by(0, |item, _| item % 2 == 0).subscribe(observer.clone());
    observer.values()
  };
  assert_eq!(0xDEADBEEF_u32 % 2, 1);
  assert_eq!(even(0xDEADBEEF), vec![false]);
  assert_eq!(0xDEADBEE_u32 % 2, 0);
  assert_eq!(even(0xDEADBEE), vec![true]);
}

#[rxkit_macro::test]
fn resubscribing_consumer_is_a_violation() {
  let consumer = DisposableObserver::new(Callbacks::new(|_: i32| {}, |_: RxError| {}, ()));
  let first_cancelled = Arc::new(AtomicUsize::new(0));
  let c_first_cancelled = first_cancelled.clone();
  let pending = Single::<i32>::create(move |emitter| {
    let c_first_cancelled = c_first_cancelled.clone();
    emitter.set_cancellable(move || {
      c_first_cancelled.fetch_add(1, Ordering::SeqCst);
    });
    Ok(())
  });

  let ((), sunk) = capture_errors(|| {
    pending.subscribe(consumer.clone());
    pending.subscribe(consumer.clone());
  });

  assert_eq!(sunk.len(), 1);
  assert!(sunk[0].is_protocol_violation());
  assert!(sunk[0].to_string().contains("multiple times"));
  // Only the rejected second subscription got cancelled.
  assert_eq!(first_cancelled.load(Ordering::SeqCst), 1);
  assert!(!consumer.is_disposed());

  consumer.dispose();
  assert_eq!(first_cancelled.load(Ordering::SeqCst), 2);
}

#[rxkit_macro::test]
fn operator_chain() {
  let events = Arc::new(Mutex::new(Vec::new()));
  let (c1, c2, c3) = (events.clone(), events.clone(), events.clone());
  let observer = TestObserver::<usize>::new();

  Single::just("rx")
    .do_on_subscribe(move |_| c1.lock().push("subscribe"))
    .flat_map(|s| Ok(Single::just(format!("{s}kit"))))
    .map(|s| s.len())
    .do_on_success(move |_| c2.lock().push("success"))
    .do_finally(move || c3.lock().push("finally"))
    .subscribe(observer.clone());

  assert_eq!(observer.values(), vec![5]);
  assert_eq!(*events.lock(), vec!["subscribe", "success", "finally"]);
}

#[rxkit_macro::test]
async fn await_a_single() {
  let outcome = Single::equals(Single::just(3), Single::just(1).map(|v| v + 2)).to_future().await;
  assert_eq!(outcome.ok(), Some(true));
}
