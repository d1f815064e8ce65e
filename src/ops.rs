//! Operators. Each file adds inherent methods to the kinds it applies to and
//! holds the observer decorator that implements it.

pub mod amb;
pub mod cache;
pub mod contains;
pub mod equals;
pub mod finalize;
pub mod flat_map;
pub mod into_future;
pub mod lifecycle;
pub mod map;

pub use into_future::SingleFuture;
