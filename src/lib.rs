//! # rxkit: a reactive core
//!
//! Four reactive kinds share one subscription protocol:
//!
//! | Type | Signals |
//! |------|---------|
//! | [`Completable`] | `on_subscribe (on_error \| on_complete)?` |
//! | [`Maybe`] | `on_subscribe (on_success \| on_error \| on_complete)?` |
//! | [`Single`] | `on_subscribe (on_success \| on_error)?` |
//! | [`Observable`] | `on_subscribe on_next* (on_error \| on_complete)?` |
//!
//! All of them are aliases of [`Source`]: a lazy, cloneable description of
//! a computation. Every `subscribe` starts an independent subscription, and
//! the observer is wrapped in a decorator that enforces the protocol above.
//! Cancellation flows the other way through [`Disposable`] handles.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxkit::prelude::*;
//!
//! let greeting = Single::create(|emitter| {
//!   emitter.on_success("Hello");
//!   Ok(())
//! })
//! .map(|s| format!("{s} World"))
//! .cache();
//!
//! let handle = greeting.subscribe_by(|s| println!("{s}"), |e| eprintln!("{e}"));
//! assert!(handle.is_disposed());
//! ```
//!
//! ## Errors nobody can receive
//!
//! An error raised after a subscription already terminated, or a panic in a
//! disposal action, cannot travel downstream. It goes to the fallback sink
//! configured in [`plugins`], which logs through `tracing` by default.
//!
//! [`Disposable`]: disposable::Disposable

pub mod completable;
pub mod disposable;
pub mod emitter;
pub mod error;
pub mod factory;
pub mod maybe;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod plugins;
pub mod prelude;
pub mod single;
pub mod source;
pub mod testing;

pub use error::{Result, RxError};
pub use source::{Completable, Maybe, Observable, ObserverKind, Origin, Single, Source, SourceKind};

#[cfg(all(doctest, not(target_arch = "wasm32")))]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
