//! Factories shared by every source kind.
//!
//! | Factory | Behaviour |
//! |---|---|
//! | [`defer`](Source::defer) | builds a fresh source on every subscription |
//! | [`error`](Source::error) | fails immediately with a fixed error |
//! | [`error_with`](Source::error_with) | fails immediately with a fresh error |
//! | [`never`](Source::never) | subscribes and then stays silent |
//!
//! Kind specific factories (`create`, `just`, `empty`, ...) live with their
//! kind.
//!
//! ```rust
//! use rxkit::{testing::TestObserver, Single};
//!
//! let single = Single::defer(|| {
//!   println!("Hi!");
//!   Ok(Single::just("Hello!"))
//! });
//! let observer = TestObserver::<&str>::new();
//! single.subscribe(observer.clone());
//! assert_eq!(observer.values(), vec!["Hello!"]);
//! ```

use crate::{
  disposable,
  error::{catch_callback, catch_fallible, Result, RxError},
  source::{fail, ObserverKind, Source},
};

impl<O: ?Sized + ObserverKind> Source<O> {
  /// Call `supplier` on every subscription and subscribe to the source it
  /// returns. A failing supplier terminates the observer with its error.
  pub fn defer<F>(supplier: F) -> Self
  where
    F: Fn() -> Result<Source<O>> + Send + Sync + 'static,
  {
    Self::factory("defer", move |observer| match catch_fallible(&supplier) {
      Ok(source) => source.subscribe(observer),
      Err(err) => fail(&*observer, err),
    })
  }

  /// Fail every subscriber with a clone of `err`.
  pub fn error(err: RxError) -> Self {
    Self::factory("error", move |observer| fail(&*observer, err.clone()))
  }

  /// Fail every subscriber with an error built for it by `supplier`.
  pub fn error_with<F>(supplier: F) -> Self
  where
    F: Fn() -> RxError + Send + Sync + 'static,
  {
    Self::factory("error_with", move |observer| {
      let err = catch_callback(&supplier).unwrap_or_else(|panic| panic);
      fail(&*observer, err)
    })
  }

  pub fn never() -> Self {
    Self::factory("never", |observer| observer.on_subscribe(disposable::empty()))
  }
}
