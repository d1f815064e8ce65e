//! Consumers that are themselves a [`Disposable`].
//!
//! A [`DisposableObserver`] owns the upstream handle of its single
//! subscription. It can be disposed before it is subscribed (whatever
//! arrives later is disposed on the spot), runs the handler's `on_start`
//! hook once the handle is recorded, and refuses to be subscribed twice.

use std::{
  any::type_name,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use super::{
  report_violation, BaseObserver, CompletableObserver, MaybeObserver, Observer, SingleObserver,
};
use crate::{
  disposable::{Disposable, DisposableRef, SerialDisposable},
  error::{catch_fallible, Result, RxError},
  plugins,
};

/// Shared part of every handler.
pub trait Handler: Send + Sync {
  /// Called once, right after the upstream handle is recorded and before any
  /// other signal. An `Err` (or a panic) disposes the upstream and is
  /// delivered to [`on_error`](Self::on_error).
  fn on_start(&self) -> Result<()> { Ok(()) }

  fn on_error(&self, err: RxError);
}

pub trait CompletableHandler: Handler {
  fn on_complete(&self);
}

pub trait SingleHandler<T>: Handler {
  fn on_success(&self, value: T);
}

pub trait MaybeHandler<T>: Handler {
  fn on_success(&self, value: T);

  fn on_complete(&self);
}

pub trait ObserverHandler<T>: Handler {
  fn on_next(&self, value: T);

  fn on_complete(&self);
}

/// A single-use observer wrapping handler `H`, usable as a [`Disposable`].
///
/// It implements the observer trait matching every handler trait `H`
/// implements, so one handler type can drive any kind it supports.
pub struct DisposableObserver<H> {
  upstream: SerialDisposable,
  done: AtomicBool,
  handler: H,
}

impl<H: Handler> DisposableObserver<H> {
  pub fn new(handler: H) -> Arc<Self> {
    Arc::new(Self { upstream: SerialDisposable::new(), done: AtomicBool::new(false), handler })
  }

  #[inline]
  pub fn handler(&self) -> &H { &self.handler }

  /// Claims the terminal slot and releases the upstream handle without
  /// disposing it.
  fn finish(&self) -> bool {
    if self.done.swap(true, Ordering::AcqRel) {
      return false;
    }
    self.upstream.detach();
    true
  }
}

impl<H: Handler> BaseObserver for DisposableObserver<H> {
  fn on_subscribe(&self, d: DisposableRef) {
    match self.upstream.set_once(d) {
      Ok(true) => {
        if let Err(err) = catch_fallible(|| self.handler.on_start()) {
          self.upstream.dispose();
          if !self.done.swap(true, Ordering::AcqRel) {
            self.handler.on_error(err);
          }
        }
      }
      // Disposed before it was subscribed.
      Ok(false) => {}
      Err(_) => report_violation(format!(
        "It is not allowed to subscribe with a(n) {} multiple times.",
        type_name::<Self>()
      )),
    }
  }

  fn on_error(&self, err: RxError) {
    if self.finish() {
      self.handler.on_error(err);
    } else {
      plugins::on_error(err);
    }
  }
}

impl<H: CompletableHandler> CompletableObserver for DisposableObserver<H> {
  fn on_complete(&self) {
    if self.finish() {
      self.handler.on_complete();
    }
  }
}

impl<T, H: SingleHandler<T>> SingleObserver<T> for DisposableObserver<H> {
  fn on_success(&self, value: T) {
    if self.finish() {
      self.handler.on_success(value);
    }
  }
}

impl<T, H: MaybeHandler<T>> MaybeObserver<T> for DisposableObserver<H> {
  fn on_success(&self, value: T) {
    if self.finish() {
      self.handler.on_success(value);
    }
  }

  fn on_complete(&self) {
    if self.finish() {
      self.handler.on_complete();
    }
  }
}

impl<T, H: ObserverHandler<T>> Observer<T> for DisposableObserver<H> {
  fn on_next(&self, value: T) {
    if !self.done.load(Ordering::Acquire) {
      self.handler.on_next(value);
    }
  }

  fn on_complete(&self) {
    if self.finish() {
      self.handler.on_complete();
    }
  }
}

impl<H: Handler> Disposable for DisposableObserver<H> {
  #[inline]
  fn dispose(&self) { self.upstream.dispose(); }

  #[inline]
  fn is_disposed(&self) -> bool { self.upstream.is_disposed() }
}
