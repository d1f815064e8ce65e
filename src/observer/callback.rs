use super::{CompletableHandler, Handler, MaybeHandler, ObserverHandler, SingleHandler};
use crate::error::RxError;

/// A handler assembled from closures.
///
/// `on_value` receives successes (Single, Maybe) or items (Observable);
/// kinds without a value or without completion take `()` in that position.
pub struct Callbacks<N, E, C> {
  on_value: N,
  on_error: E,
  on_complete: C,
}

impl<N, E, C> Callbacks<N, E, C> {
  #[inline]
  pub fn new(on_value: N, on_error: E, on_complete: C) -> Self {
    Self { on_value, on_error, on_complete }
  }
}

impl<N, E, C> Handler for Callbacks<N, E, C>
where
  N: Send + Sync,
  E: Fn(RxError) + Send + Sync,
  C: Send + Sync,
{
  #[inline]
  fn on_error(&self, err: RxError) { (self.on_error)(err) }
}

impl<T, N, E, C> SingleHandler<T> for Callbacks<N, E, C>
where
  N: Fn(T) + Send + Sync,
  E: Fn(RxError) + Send + Sync,
  C: Send + Sync,
{
  #[inline]
  fn on_success(&self, value: T) { (self.on_value)(value) }
}

impl<T, N, E, C> MaybeHandler<T> for Callbacks<N, E, C>
where
  N: Fn(T) + Send + Sync,
  E: Fn(RxError) + Send + Sync,
  C: Fn() + Send + Sync,
{
  #[inline]
  fn on_success(&self, value: T) { (self.on_value)(value) }

  #[inline]
  fn on_complete(&self) { (self.on_complete)() }
}

impl<T, N, E, C> ObserverHandler<T> for Callbacks<N, E, C>
where
  N: Fn(T) + Send + Sync,
  E: Fn(RxError) + Send + Sync,
  C: Fn() + Send + Sync,
{
  #[inline]
  fn on_next(&self, value: T) { (self.on_value)(value) }

  #[inline]
  fn on_complete(&self) { (self.on_complete)() }
}

impl<N, E, C> CompletableHandler for Callbacks<N, E, C>
where
  N: Send + Sync,
  E: Fn(RxError) + Send + Sync,
  C: Fn() + Send + Sync,
{
  #[inline]
  fn on_complete(&self) { (self.on_complete)() }
}
