//! Error taxonomy shared by every reactive kind.
//!
//! Errors travel through `on_error` signals and may be replayed (`cache`) or
//! re-routed (fallback sink), so [`RxError`] is cheap to clone.

use std::{
  any::Any,
  error::Error as StdError,
  panic::{catch_unwind, AssertUnwindSafe},
  sync::Arc,
};

use thiserror::Error;

/// The error carried by `on_error` signals and returned by fallible calls.
#[derive(Debug, Clone, Error)]
pub enum RxError {
  /// A required argument was absent.
  #[error("argument `{0}` must not be absent")]
  MissingArgument(&'static str),

  /// A consumer or producer broke the single-subscription or
  /// single-terminal-signal contract.
  #[error("protocol violation: {0}")]
  ProtocolViolation(String),

  /// A business-logic failure wrapping an arbitrary error value.
  #[error(transparent)]
  Failure(Arc<dyn StdError + Send + Sync>),

  /// A business-logic failure described by a message.
  #[error("{0}")]
  Message(Arc<str>),

  /// A user callback panicked.
  #[error("callback panicked: {0}")]
  Panic(String),

  /// An error hook failed while handling another error.
  #[error("multiple errors occurred: {0:?}")]
  Composite(Vec<RxError>),

  /// A source had nothing to race or emit.
  #[error("sequence contains no elements")]
  NoSuchElement,

  /// The subscription ended without delivering a signal.
  #[error("the subscription was disposed before a signal arrived")]
  Disposed,
}

impl RxError {
  /// Wrap any error value as a business failure.
  pub fn new<E>(err: E) -> Self
  where
    E: StdError + Send + Sync + 'static,
  {
    RxError::Failure(Arc::new(err))
  }

  /// A business failure described by `msg`.
  pub fn msg(msg: impl AsRef<str>) -> Self { RxError::Message(Arc::from(msg.as_ref())) }

  pub fn protocol_violation(msg: impl Into<String>) -> Self {
    RxError::ProtocolViolation(msg.into())
  }

  /// Convert a panic payload, as returned by `catch_unwind`.
  pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
      (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "non-string panic payload".to_string()
    };
    RxError::Panic(msg)
  }

  #[inline]
  pub fn is_protocol_violation(&self) -> bool { matches!(self, RxError::ProtocolViolation(_)) }

  /// Combine two errors, flattening nested composites.
  pub fn compose(self, other: RxError) -> Self {
    let mut errors = match self {
      RxError::Composite(errors) => errors,
      err => vec![err],
    };
    match other {
      RxError::Composite(more) => errors.extend(more),
      err => errors.push(err),
    }
    RxError::Composite(errors)
  }
}

impl From<&str> for RxError {
  fn from(msg: &str) -> Self { RxError::msg(msg) }
}

impl From<String> for RxError {
  fn from(msg: String) -> Self { RxError::Message(Arc::from(msg)) }
}

pub type Result<T, E = RxError> = std::result::Result<T, E>;

/// Run a user callback, turning a panic into [`RxError::Panic`].
pub(crate) fn catch_callback<R>(f: impl FnOnce() -> R) -> Result<R> {
  catch_unwind(AssertUnwindSafe(f)).map_err(RxError::from_panic)
}

/// Run a fallible user callback; both its `Err` and a panic become errors.
pub(crate) fn catch_fallible<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
  catch_callback(f).and_then(|r| r)
}
