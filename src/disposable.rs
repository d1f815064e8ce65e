//! Resource-release handles.
//!
//! A [`Disposable`] moves from active to disposed exactly once, no matter how
//! many threads call [`Disposable::dispose`]. Handles are shared as
//! [`DisposableRef`]; whoever holds the last reference is free to dispose it.

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::{error::catch_callback, plugins};

mod composite;
mod serial;

pub use composite::CompositeDisposable;
pub use serial::SerialDisposable;

/// A resource that can be released.
pub trait Disposable: Send + Sync {
  /// Release the resource. Idempotent and safe to call concurrently.
  fn dispose(&self);

  /// Whether `dispose` has taken effect. Never blocks on the release action.
  fn is_disposed(&self) -> bool;
}

pub type DisposableRef = Arc<dyn Disposable>;

impl Debug for dyn Disposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("dyn Disposable").field("is_disposed", &self.is_disposed()).finish()
  }
}

/// A disposable that only records whether it has been disposed.
#[derive(Debug, Default)]
pub struct BooleanDisposable(AtomicBool);

impl BooleanDisposable {
  pub fn new() -> Self { Self::default() }
}

impl Disposable for BooleanDisposable {
  #[inline]
  fn dispose(&self) { self.0.store(true, Ordering::Release); }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Runs an action the first time it is disposed.
///
/// A panic raised by the action is routed to the fallback error sink.
pub struct ActionDisposable<F> {
  disposed: AtomicBool,
  action: Mutex<Option<F>>,
}

impl<F> ActionDisposable<F>
where
  F: FnOnce() + Send,
{
  pub fn new(action: F) -> Self {
    Self { disposed: AtomicBool::new(false), action: Mutex::new(Some(action)) }
  }
}

impl<F> Disposable for ActionDisposable<F>
where
  F: FnOnce() + Send,
{
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    let action = self.action.lock().take();
    if let Some(action) = action {
      if let Err(err) = catch_callback(action) {
        plugins::on_error(err);
      }
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

static DISPOSED: Lazy<DisposableRef> = Lazy::new(|| {
  let d = BooleanDisposable::new();
  d.dispose();
  Arc::new(d)
});

/// A fresh, active disposable with no release action.
pub fn empty() -> DisposableRef { Arc::new(BooleanDisposable::new()) }

/// A shared disposable that is already disposed.
pub fn disposed() -> DisposableRef { DISPOSED.clone() }

/// A disposable running `action` once when disposed.
pub fn from_fn<F>(action: F) -> DisposableRef
where
  F: FnOnce() + Send + 'static,
{
  Arc::new(ActionDisposable::new(action))
}

/// Identity of a shared disposable, stable while any reference is alive.
#[inline]
pub(crate) fn identity(d: &DisposableRef) -> usize { Arc::as_ptr(d) as *const () as usize }

/// An RAII guard that disposes the wrapped handle when dropped.
///
/// If the guard is not bound to a variable it is dropped, and the handle
/// disposed, immediately.
#[derive(Debug)]
#[must_use]
pub struct DisposeGuard(Option<DisposableRef>);

impl DisposeGuard {
  pub fn new(disposable: DisposableRef) -> Self { DisposeGuard(Some(disposable)) }

  /// Give up the guard without disposing.
  pub fn into_inner(mut self) -> DisposableRef {
    match self.0.take() {
      Some(d) => d,
      None => disposed(),
    }
  }
}

impl Drop for DisposeGuard {
  fn drop(&mut self) {
    if let Some(d) = self.0.take() {
      d.dispose();
    }
  }
}
