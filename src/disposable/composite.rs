use std::collections::HashMap;

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::{identity, Disposable, DisposableRef};

type Members = HashMap<usize, SmallVec<[DisposableRef; 1]>>;

/// A container of disposables with O(1) add and removal.
///
/// Membership is by identity. The same handle may be added several times;
/// every entry is tracked, and disposed, independently. Once the composite
/// itself is disposed, [`add`](Self::add) disposes its argument on the spot.
pub struct CompositeDisposable {
  // `None` once the composite is disposed.
  members: Mutex<Option<Members>>,
}

impl Default for CompositeDisposable {
  fn default() -> Self { Self::new() }
}

impl CompositeDisposable {
  pub fn new() -> Self { Self { members: Mutex::new(Some(HashMap::new())) } }

  /// Add `d`; returns `false` (and disposes `d`) if the composite is already
  /// disposed.
  pub fn add(&self, d: DisposableRef) -> bool {
    let mut members = self.members.lock();
    if let Some(members) = members.as_mut() {
      members.entry(identity(&d)).or_default().push(d);
      return true;
    }
    drop(members);
    d.dispose();
    false
  }

  /// Remove one entry of `d` and dispose it. Returns whether `d` was a
  /// member.
  pub fn remove(&self, d: &DisposableRef) -> bool {
    let removed = self.delete(d);
    if removed {
      d.dispose();
    }
    removed
  }

  /// Remove one entry of `d` without disposing it; the caller owns it again.
  pub fn delete(&self, d: &DisposableRef) -> bool {
    let mut members = self.members.lock();
    let Some(members) = members.as_mut() else { return false };
    let key = identity(d);
    let Some(entries) = members.get_mut(&key) else { return false };
    entries.pop();
    if entries.is_empty() {
      members.remove(&key);
    }
    true
  }

  /// Dispose every current member and empty the container. The composite
  /// stays usable.
  ///
  /// Members are snapshotted and removed under the lock, then disposed
  /// outside of it: a concurrent `add` lands either in the snapshot or in
  /// the emptied container, never in between.
  pub fn clear(&self) {
    let snapshot = match self.members.lock().as_mut() {
      Some(members) => std::mem::take(members),
      None => return,
    };
    dispose_all(snapshot);
  }

  /// Number of entries currently held.
  pub fn len(&self) -> usize {
    self.members.lock().as_ref().map_or(0, |members| members.values().map(SmallVec::len).sum())
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl FromIterator<DisposableRef> for CompositeDisposable {
  fn from_iter<I: IntoIterator<Item = DisposableRef>>(iter: I) -> Self {
    let composite = CompositeDisposable::new();
    for d in iter {
      composite.add(d);
    }
    composite
  }
}

fn dispose_all(members: Members) {
  for d in members.into_values().flatten() {
    d.dispose();
  }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let members = self.members.lock().take();
    if let Some(members) = members {
      dispose_all(members);
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.members.lock().is_none() }
}
