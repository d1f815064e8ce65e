//! Process-wide hooks: the fallback error sink and subscription interception.
//!
//! Both hooks start out unset. Installing a hook replaces the previous one
//! atomically; readers always see either the old or the new hook.
//!
//! The fallback sink receives errors that can no longer be delivered through
//! a subscription: an `on_error` after a terminal signal, a panic raised by a
//! terminal handler, a failing dispose action. Resolution order is
//!
//! 1. the handler installed for the current thread by [`with_error_handler`],
//! 2. the process handler installed by [`set_error_handler`],
//! 3. the default, which logs the error through `tracing`.

use std::{cell::RefCell, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{
  error::RxError,
  source::{Origin, SourceKind},
};

pub type ErrorHandler = Arc<dyn Fn(RxError) + Send + Sync>;
pub type SubscribeHook = Arc<dyn Fn(SourceKind, Origin) + Send + Sync>;

static ERROR_HANDLER: Lazy<RwLock<Option<ErrorHandler>>> = Lazy::new(|| RwLock::new(None));
static SUBSCRIBE_HOOK: Lazy<RwLock<Option<SubscribeHook>>> = Lazy::new(|| RwLock::new(None));

thread_local! {
  static SCOPED_HANDLER: RefCell<Option<ErrorHandler>> = const { RefCell::new(None) };
}

/// Install the process-wide fallback error handler, returning the previous
/// one.
pub fn set_error_handler<F>(handler: F) -> Option<ErrorHandler>
where
  F: Fn(RxError) + Send + Sync + 'static,
{
  ERROR_HANDLER.write().replace(Arc::new(handler))
}

/// Remove the process-wide handler; undeliverable errors are logged again.
pub fn reset_error_handler() -> Option<ErrorHandler> { ERROR_HANDLER.write().take() }

struct ScopeRestore(Option<ErrorHandler>);

impl Drop for ScopeRestore {
  fn drop(&mut self) {
    let previous = self.0.take();
    SCOPED_HANDLER.with(|slot| *slot.borrow_mut() = previous);
  }
}

/// Run `f` with `handler` as the fallback sink of the current thread.
///
/// The previous thread handler is restored when `f` returns or unwinds.
/// Errors routed from other threads still reach the process-wide handler.
pub fn with_error_handler<R>(handler: ErrorHandler, f: impl FnOnce() -> R) -> R {
  let previous = SCOPED_HANDLER.with(|slot| slot.borrow_mut().replace(handler));
  let _restore = ScopeRestore(previous);
  f()
}

/// Route an error that cannot be delivered downstream.
pub fn on_error(err: RxError) {
  let scoped = SCOPED_HANDLER.with(|slot| slot.borrow().clone());
  if let Some(handler) = scoped {
    handler(err);
    return;
  }
  let global = ERROR_HANDLER.read().clone();
  match global {
    Some(handler) => handler(err),
    None => tracing::error!(error = %err, "undeliverable error routed to the fallback sink"),
  }
}

/// Install the hook called by every `subscribe` before the source runs.
pub fn set_on_subscribe<F>(hook: F) -> Option<SubscribeHook>
where
  F: Fn(SourceKind, Origin) + Send + Sync + 'static,
{
  SUBSCRIBE_HOOK.write().replace(Arc::new(hook))
}

pub fn reset_on_subscribe() -> Option<SubscribeHook> { SUBSCRIBE_HOOK.write().take() }

pub(crate) fn on_subscribe(kind: SourceKind, origin: Origin) {
  let hook = SUBSCRIBE_HOOK.read().clone();
  if let Some(hook) = hook {
    hook(kind, origin);
  }
}

#[cfg(test)]
pub(crate) mod test_util {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use super::*;

  /// Collects every error routed to the fallback sink of the current thread
  /// while `f` runs.
  pub fn capture_errors<R>(f: impl FnOnce() -> R) -> (R, Vec<RxError>) {
    let sink = Arc::new(Mutex::new(Vec::new()));
    let c_sink = sink.clone();
    let r = with_error_handler(Arc::new(move |e: RxError| c_sink.lock().push(e)), f);
    let errors = std::mem::take(&mut *sink.lock());
    (r, errors)
  }
}
