//! Usage: Mutex extension trait with automatic recovery from poisoned state.

use std::sync::{Mutex, MutexGuard, TryLockError};

/// Extension trait for `Mutex` that recovers poisoned locks instead of panicking.
pub(crate) trait MutexExt<T> {
    /// Try to take the lock without blocking. Returns `None` when another
    /// holder is in flight; a poisoned lock is recovered and logged.
    fn try_lock_or_recover(&self) -> Option<MutexGuard<'_, T>>;
}

impl<T> MutexExt<T> for Mutex<T> {
    #[track_caller]
    fn try_lock_or_recover(&self) -> Option<MutexGuard<'_, T>> {
        match self.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(poisoned)) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    mutex_type = std::any::type_name::<T>(),
                    file = loc.file(),
                    line = loc.line(),
                    column = loc.column(),
                    "Mutex poisoned (a thread panicked while holding it); recovered, state may be inconsistent"
                );
                Some(poisoned.into_inner())
            }
        }
    }
}
