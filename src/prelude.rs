//! Prelude module for convenient imports.

pub use crate::{
  disposable::{CompositeDisposable, Disposable, DisposableRef, SerialDisposable},
  emitter::{CompletableEmitter, MaybeEmitter, ObservableEmitter, SingleEmitter},
  error::{Result, RxError},
  observer::{
    BaseObserver, Callbacks, CompletableObserver, DisposableObserver, MaybeObserver, Observer,
    SingleObserver,
  },
  ops::SingleFuture,
  source::{Completable, Maybe, Observable, Origin, Single, Source, SourceKind},
};
