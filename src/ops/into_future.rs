//! Bridge a Single into a [`Future`].
//!
//! ## Behavior
//!
//! - **Success**: the future resolves with `Ok(value)`.
//! - **Error**: the future resolves with `Err(error)`.
//! - **Dropped early**: dropping the future disposes the subscription.
//! - **Disposed upstream**: if the subscription ends without a terminal
//!   signal, the future resolves with [`RxError::Disposed`].
//!
//! ```rust
//! use rxkit::Single;
//!
//! let value = futures::executor::block_on(Single::just(42).to_future());
//! assert_eq!(value.ok(), Some(42));
//! ```

use std::{
  future::Future,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll},
};

use futures::{channel::oneshot, ready};
use parking_lot::Mutex;
use pin_project_lite::pin_project;

use crate::{
  disposable::{Disposable, DisposableRef, SerialDisposable},
  error::{Result, RxError},
  observer::{BaseObserver, SingleObserver},
  Single,
};

// ============================================================================
// SingleFuture
// ============================================================================

pin_project! {
  /// Future returned by [`Single::to_future`].
  pub struct SingleFuture<T> {
    #[pin]
    receiver: oneshot::Receiver<Result<T>>,
    upstream: Arc<SerialDisposable>,
  }

  impl<T> PinnedDrop for SingleFuture<T> {
    fn drop(this: Pin<&mut Self>) {
      this.project().upstream.dispose();
    }
  }
}

impl<T> Future for SingleFuture<T> {
  type Output = Result<T>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.project();
    match ready!(this.receiver.poll(cx)) {
      Ok(outcome) => Poll::Ready(outcome),
      Err(oneshot::Canceled) => Poll::Ready(Err(RxError::Disposed)),
    }
  }
}

// ============================================================================
// FutureObserver
// ============================================================================

struct FutureObserver<T> {
  sender: Mutex<Option<oneshot::Sender<Result<T>>>>,
  upstream: Arc<SerialDisposable>,
}

impl<T> FutureObserver<T> {
  fn complete(&self, outcome: Result<T>) {
    self.upstream.detach();
    if let Some(sender) = self.sender.lock().take() {
      // The receiver is gone only when the future was dropped.
      let _ = sender.send(outcome);
    }
  }
}

impl<T: Send> BaseObserver for FutureObserver<T> {
  #[inline]
  fn on_subscribe(&self, d: DisposableRef) { self.upstream.set(Some(d)); }

  #[inline]
  fn on_error(&self, err: RxError) { self.complete(Err(err)); }
}

impl<T: Send> SingleObserver<T> for FutureObserver<T> {
  #[inline]
  fn on_success(&self, value: T) { self.complete(Ok(value)); }
}

impl<T: Send + 'static> Single<T> {
  /// Subscribe and return a future of the outcome. The subscription happens
  /// immediately, not on first poll.
  pub fn to_future(&self) -> SingleFuture<T> {
    let (sender, receiver) = oneshot::channel();
    let upstream = Arc::new(SerialDisposable::new());
    self.subscribe(Arc::new(FutureObserver {
      sender: Mutex::new(Some(sender)),
      upstream: upstream.clone(),
    }));
    SingleFuture { receiver, upstream }
  }
}
