//! Observer traits: the consumer side of each reactive kind.
//!
//! Every kind shares [`BaseObserver`] (`on_subscribe` + `on_error`) and adds
//! its own legal signals:
//!
//! | Trait | Legal sequence |
//! |---|---|
//! | [`CompletableObserver`] | `on_subscribe (on_error \| on_complete)?` |
//! | [`MaybeObserver`] | `on_subscribe (on_success \| on_error \| on_complete)?` |
//! | [`SingleObserver`] | `on_subscribe (on_success \| on_error)?` |
//! | [`Observer`] | `on_subscribe on_next* (on_error \| on_complete)?` |
//!
//! All methods take `&self`: observers are shared behind `Arc` between the
//! producer and whoever disposes the subscription.

use crate::{disposable::DisposableRef, error::RxError};

mod callback;
mod disposable;
mod protocol;

pub use callback::Callbacks;
pub(crate) use protocol::report_violation;
pub use disposable::{
  CompletableHandler, DisposableObserver, Handler, MaybeHandler, ObserverHandler, SingleHandler,
};

// ============================================================================
// Observer Traits
// ============================================================================

/// The capability shared by every observer kind.
pub trait BaseObserver: Send + Sync {
  /// Receive the handle that cancels this subscription. Called exactly once,
  /// before any other signal.
  fn on_subscribe(&self, d: DisposableRef);

  /// Terminal failure.
  fn on_error(&self, err: RxError);
}

pub trait CompletableObserver: BaseObserver {
  fn on_complete(&self);
}

pub trait SingleObserver<T>: BaseObserver {
  fn on_success(&self, value: T);
}

pub trait MaybeObserver<T>: BaseObserver {
  fn on_success(&self, value: T);

  fn on_complete(&self);
}

pub trait Observer<T>: BaseObserver {
  fn on_next(&self, value: T);

  fn on_complete(&self);
}
