use parking_lot::Mutex;

use super::{Disposable, DisposableRef};
use crate::error::{Result, RxError};

enum Slot {
  Open(Option<DisposableRef>),
  Disposed,
}

/// A single swappable disposable slot.
///
/// Replacing the occupant disposes the previous one; once the slot itself is
/// disposed, anything placed into it is disposed on arrival. Every occupant
/// is disposed at most once by the slot.
pub struct SerialDisposable {
  slot: Mutex<Slot>,
}

impl Default for SerialDisposable {
  fn default() -> Self { Self { slot: Mutex::new(Slot::Open(None)) } }
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn with(d: DisposableRef) -> Self { Self { slot: Mutex::new(Slot::Open(Some(d))) } }

  /// Swap in `next`, disposing the previous occupant. `None` clears the
  /// slot. Returns `false` when the slot was already disposed, in which case
  /// `next` has been disposed instead.
  pub fn set(&self, next: Option<DisposableRef>) -> bool {
    let mut slot = self.slot.lock();
    match &mut *slot {
      Slot::Open(current) => {
        let previous = std::mem::replace(current, next);
        drop(slot);
        if let Some(previous) = previous {
          previous.dispose();
        }
        true
      }
      Slot::Disposed => {
        drop(slot);
        if let Some(next) = next {
          next.dispose();
        }
        false
      }
    }
  }

  /// Store `next` only if the slot has never been filled.
  ///
  /// * `Ok(true)`: stored.
  /// * `Ok(false)`: the slot was disposed beforehand, `next` got disposed.
  /// * `Err(ProtocolViolation)`: the slot is already occupied; `next` got
  ///   disposed and the current occupant is left untouched.
  pub fn set_once(&self, next: DisposableRef) -> Result<bool> {
    let mut slot = self.slot.lock();
    match &mut *slot {
      Slot::Open(current @ None) => {
        *current = Some(next);
        Ok(true)
      }
      Slot::Open(Some(_)) => {
        drop(slot);
        next.dispose();
        Err(RxError::protocol_violation("Disposable already set!"))
      }
      Slot::Disposed => {
        drop(slot);
        next.dispose();
        Ok(false)
      }
    }
  }

  /// Close the slot without disposing its occupant, which is handed back.
  /// Later arrivals are disposed as usual.
  pub fn detach(&self) -> Option<DisposableRef> {
    match std::mem::replace(&mut *self.slot.lock(), Slot::Disposed) {
      Slot::Open(current) => current,
      Slot::Disposed => None,
    }
  }

  /// The current occupant, if any.
  pub fn get(&self) -> Option<DisposableRef> {
    match &*self.slot.lock() {
      Slot::Open(current) => current.clone(),
      Slot::Disposed => None,
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    let previous = std::mem::replace(&mut *self.slot.lock(), Slot::Disposed);
    if let Slot::Open(Some(d)) = previous {
      d.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { matches!(*self.slot.lock(), Slot::Disposed) }
}
