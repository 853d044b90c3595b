//! Usage: Process-wide lock table keyed by absolute config path.
//!
//! Every mutating operation (switch, restore) against a given config file must
//! hold that file's lock for the whole backup → write → validate →
//! (commit | rollback) sequence. Operations on different paths are independent.

use crate::shared::mutex_ext::MutexExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

static PATH_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn normalize(path: &Path) -> PathBuf {
    // The live file may not exist yet (first-run switch), so canonicalize is
    // not an option; `absolute` resolves relative paths without touching disk.
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let table = PATH_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut table = match table.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    Arc::clone(table.entry(normalize(path)).or_default())
}

/// Run `f` while holding the per-path lock, or return `None` when the path is
/// busy with another switch/restore. Acquisition is non-blocking: the loser of
/// a race is told immediately (callers map `None` to `BUSY`) rather than
/// queued behind an in-flight operation.
pub(crate) fn with_path_lock<T>(path: &Path, f: impl FnOnce() -> T) -> Option<T> {
    let lock = lock_for(path);
    let _guard = lock.try_lock_or_recover()?;
    Some(f())
}
