//! The clustering core: point collection, neighbor cache, greedy
//! partitioner, visible-set differ, recompute scheduler, and the engine
//! facade that wires them together.

pub mod diff;
pub mod engine;
pub mod geometry;
pub mod neighbors;
pub mod partition;
pub mod points;
pub mod schedule;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Locks a `Mutex`, absorbing poisoning. The guarded structures stay
/// version-consistent even if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared-read access to an `RwLock`, absorbing poisoning.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive access to an `RwLock`, absorbing poisoning.
pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
