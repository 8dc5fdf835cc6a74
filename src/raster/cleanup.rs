//! Deferred deletion of backing files that could not be unlinked right after
//! mapping.
//!
//! Paths land here only on the fallback path. They are removed when their
//! raster is released, or by an `atexit` hook when the process exits normally.

use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, Once};

static PENDING: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));
static EXIT_HOOK: Once = Once::new();

fn pending() -> MutexGuard<'static, HashSet<PathBuf>> {
    match PENDING.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

extern "C" fn purge_at_exit() {
    purge();
}

/// Schedule `path` for deletion at process exit.
pub(crate) fn defer(path: &Path) {
    EXIT_HOOK.call_once(|| {
        let rc = unsafe { libc::atexit(purge_at_exit) };
        if rc != 0 {
            warn!("cleanup: Failed to register exit hook; deferred files may outlive the process");
        }
    });
    pending().insert(path.to_path_buf());
}

/// Delete a deferred `path` now. Returns true if the file is gone.
///
/// A failure leaves the path scheduled for exit.
pub(crate) fn remove(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            pending().remove(path);
            debug!("cleanup: Removed deferred backing file {:?}", path);
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            pending().remove(path);
            true
        }
        Err(e) => {
            warn!("cleanup: Still cannot remove {:?}: {}; retrying at exit", path, e);
            false
        }
    }
}

/// Whether `path` is waiting for deferred deletion.
pub fn is_pending(path: &Path) -> bool {
    pending().contains(path)
}

/// Delete every pending file. Returns how many were removed; the rest stay
/// pending.
pub fn purge() -> usize {
    let paths: Vec<PathBuf> = pending().iter().cloned().collect();
    paths.iter().filter(|path| remove(path)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_file_is_removed_by_purge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deferred.tmp");
        std::fs::write(&path, b"x").unwrap();

        defer(&path);
        assert!(is_pending(&path));

        assert!(purge() >= 1);
        assert!(!path.exists());
        assert!(!is_pending(&path));
    }

    #[test]
    fn removing_a_missing_file_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-created.tmp");

        defer(&path);
        assert!(remove(&path));
        assert!(!is_pending(&path));
    }
}
