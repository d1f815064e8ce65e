use std::{
  collections::VecDeque,
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use crate::{
  disposable::{self, Disposable, DisposableRef, SerialDisposable},
  error::RxError,
  observer::Observer,
  plugins,
};

enum Signal<T> {
  Next(T),
  Error(RxError),
  Complete,
}

/// Serializes signals coming from any number of threads.
///
/// Producers enqueue, and whichever thread moves `wip` off zero drains the
/// queue until no work is missed. No lock is held while a signal is
/// delivered, so a downstream may re-enter the emitter.
struct Serializer<T> {
  queue: Mutex<VecDeque<Signal<T>>>,
  wip: AtomicUsize,
  // A terminal signal has been accepted.
  done: AtomicBool,
  disposed: AtomicBool,
  downstream: Mutex<Option<Arc<dyn Observer<T>>>>,
  resource: SerialDisposable,
}

impl<T> Serializer<T> {
  fn push(&self, signal: Signal<T>) {
    self.queue.lock().push_back(signal);
    self.drain();
  }

  fn drain(&self) {
    if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
      return;
    }
    let mut missed = 1;
    loop {
      loop {
        let signal = self.queue.lock().pop_front();
        let Some(signal) = signal else { break };
        self.deliver(signal);
      }
      missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
      if missed == 0 {
        break;
      }
    }
  }

  fn deliver(&self, signal: Signal<T>) {
    let downstream = match signal {
      Signal::Next(_) => self.downstream.lock().clone(),
      _ => self.downstream.lock().take(),
    };
    let Some(downstream) = downstream else {
      if let Signal::Error(err) = signal {
        plugins::on_error(err);
      }
      return;
    };
    match signal {
      Signal::Next(value) => downstream.on_next(value),
      Signal::Error(err) => {
        downstream.on_error(err);
        self.resource.dispose();
      }
      Signal::Complete => {
        downstream.on_complete();
        self.resource.dispose();
      }
    }
  }
}

impl<T: Send> Disposable for Serializer<T> {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    let downstream = self.downstream.lock().take();
    drop(downstream);
    self.resource.dispose();
  }

  #[inline]
  fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::Acquire) || self.done.load(Ordering::Acquire)
  }
}

/// Emitter handed to [`Observable::create`](crate::Observable::create).
///
/// Safe to call from several threads at once: signals reach the downstream
/// one at a time, in the order they were accepted.
pub struct ObservableEmitter<T>(Arc<Serializer<T>>);

impl<T> Clone for ObservableEmitter<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Send + 'static> ObservableEmitter<T> {
  pub(crate) fn new(downstream: Arc<dyn Observer<T>>) -> Self {
    Self(Arc::new(Serializer {
      queue: Mutex::new(VecDeque::new()),
      wip: AtomicUsize::new(0),
      done: AtomicBool::new(false),
      disposed: AtomicBool::new(false),
      downstream: Mutex::new(Some(downstream)),
      resource: SerialDisposable::new(),
    }))
  }

  /// Emit an item. Silently dropped once terminated or disposed.
  pub fn on_next(&self, value: T) {
    if self.is_disposed() {
      return;
    }
    self.0.push(Signal::Next(value));
  }

  pub fn on_error(&self, err: RxError) {
    if let Err(err) = self.try_on_error(err) {
      tracing::debug!("emitter already terminated, error re-routed");
      plugins::on_error(err);
    }
  }

  pub fn try_on_error(&self, err: RxError) -> Result<(), RxError> {
    if self.0.disposed.load(Ordering::Acquire) || self.0.done.swap(true, Ordering::AcqRel) {
      return Err(err);
    }
    self.0.push(Signal::Error(err));
    Ok(())
  }

  pub fn on_complete(&self) {
    if self.0.disposed.load(Ordering::Acquire) || self.0.done.swap(true, Ordering::AcqRel) {
      tracing::debug!("emitter already terminated, on_complete dropped");
      return;
    }
    self.0.push(Signal::Complete);
  }

  pub fn set_disposable(&self, d: Option<DisposableRef>) { self.0.resource.set(d); }

  pub fn set_cancellable<F>(&self, cancel: F)
  where
    F: FnOnce() + Send + 'static,
  {
    self.set_disposable(Some(disposable::from_fn(cancel)));
  }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }

  pub(crate) fn as_disposable(&self) -> DisposableRef { self.0.clone() }
}
