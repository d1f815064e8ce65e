//! The uniform subscription entry point shared by the four reactive kinds.
//!
//! A [`Source`] is an immutable, lazily evaluated description of a
//! computation: a shared `subscribe_actual` closure plus an [`Origin`] tag.
//! Nothing runs until [`Source::subscribe`] is called, and every call starts
//! an independent subscription.

use std::{
  fmt::{Display, Formatter},
  sync::Arc,
};

use crate::{
  error::{Result, RxError},
  observer::{BaseObserver, CompletableObserver, MaybeObserver, Observer, SingleObserver},
  plugins,
};

/// Which protocol a source speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
  /// `on_subscribe (on_error | on_complete)?`
  Completable,
  /// `on_subscribe (on_success | on_error | on_complete)?`
  Maybe,
  /// `on_subscribe (on_success | on_error)?`
  Single,
  /// `on_subscribe on_next* (on_error | on_complete)?`
  Observable,
}

impl Display for SourceKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      SourceKind::Completable => "Completable",
      SourceKind::Maybe => "Maybe",
      SourceKind::Single => "Single",
      SourceKind::Observable => "Observable",
    };
    f.write_str(name)
  }
}

/// How a source was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
  /// Built by a factory (`create`, `just`, `defer`, ...).
  Factory(&'static str),
  /// Built by an operator applied to other sources (`map`, `cache`, ...).
  Operator(&'static str),
}

impl Origin {
  pub fn name(&self) -> &'static str {
    match self {
      Origin::Factory(name) | Origin::Operator(name) => name,
    }
  }
}

impl Display for Origin {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Origin::Factory(name) => write!(f, "factory `{name}`"),
      Origin::Operator(name) => write!(f, "operator `{name}`"),
    }
  }
}

/// Implemented by the observer trait object of each kind.
///
/// `protect` wraps an incoming observer into the kind's protocol decorator
/// before the source logic sees it.
pub trait ObserverKind: BaseObserver + 'static {
  const KIND: SourceKind;

  fn protect(observer: Arc<Self>) -> Arc<Self>;
}

type SubscribeActual<O> = Arc<dyn Fn(Arc<O>) + Send + Sync>;

/// A lazy, re-subscribable source of signals for the observer kind `O`.
///
/// Use the aliases [`Single`](crate::Single), [`Maybe`](crate::Maybe),
/// [`Completable`](crate::Completable) and
/// [`Observable`](crate::Observable) rather than naming `O` directly.
pub struct Source<O: ?Sized> {
  origin: Origin,
  actual: SubscribeActual<O>,
}

impl<O: ?Sized> Clone for Source<O> {
  fn clone(&self) -> Self { Self { origin: self.origin, actual: self.actual.clone() } }
}

impl<O: ?Sized + ObserverKind> Source<O> {
  /// Build a source from its `subscribe_actual` logic.
  ///
  /// The closure receives an already protected observer and is responsible
  /// for calling `on_subscribe` on it first.
  pub fn new<F>(subscribe_actual: F) -> Self
  where
    F: Fn(Arc<O>) + Send + Sync + 'static,
  {
    Self::factory("custom", subscribe_actual)
  }

  pub(crate) fn factory<F>(name: &'static str, subscribe_actual: F) -> Self
  where
    F: Fn(Arc<O>) + Send + Sync + 'static,
  {
    Self { origin: Origin::Factory(name), actual: Arc::new(subscribe_actual) }
  }

  pub(crate) fn operator<F>(name: &'static str, subscribe_actual: F) -> Self
  where
    F: Fn(Arc<O>) + Send + Sync + 'static,
  {
    Self { origin: Origin::Operator(name), actual: Arc::new(subscribe_actual) }
  }

  #[inline]
  pub fn origin(&self) -> Origin { self.origin }

  #[inline]
  pub fn kind(&self) -> SourceKind { O::KIND }

  /// Subscribe `observer`, starting a fresh subscription.
  pub fn subscribe(&self, observer: Arc<O>) {
    plugins::on_subscribe(O::KIND, self.origin);
    tracing::trace!(kind = %O::KIND, origin = %self.origin, "subscribe");
    (self.actual)(O::protect(observer));
  }

  /// Like [`subscribe`](Self::subscribe), but validates that an observer was
  /// given. Nothing is subscribed when it is absent.
  pub fn try_subscribe(&self, observer: Option<Arc<O>>) -> Result<()> {
    let observer = observer.ok_or(RxError::MissingArgument("observer"))?;
    self.subscribe(observer);
    Ok(())
  }
}

/// Signal `err` to an observer that has not been subscribed to anything yet.
pub(crate) fn fail<O: ?Sized + BaseObserver>(observer: &O, err: RxError) {
  observer.on_subscribe(crate::disposable::disposed());
  observer.on_error(err);
}

/// Completion-only source.
pub type Completable = Source<dyn CompletableObserver>;
/// Zero-or-one value source.
pub type Maybe<T> = Source<dyn MaybeObserver<T>>;
/// Exactly-one value source.
pub type Single<T> = Source<dyn SingleObserver<T>>;
/// Multi-value stream source.
pub type Observable<T> = Source<dyn Observer<T>>;
