//! Integrity verification of the watch list against the live filesystem.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::store::WatchListStore;

/// Check that `path` exists and is a directory, following symlinks.
pub fn is_existing_dir(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    !path.as_os_str().is_empty() && path.is_dir()
}

/// Resolve `path` against the current directory without touching symlinks.
///
/// Falls back to `path` unchanged if the current directory is unavailable.
pub(crate) fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Outcome of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of stored paths examined.
    pub checked: usize,

    /// Paths pruned because they no longer resolve to a directory.
    pub removed: Vec<String>,
}

/// Prunes watched paths that vanished or stopped being directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    /// Remove every stored path that is not an existing directory.
    pub fn verify(store: &dyn WatchListStore) -> VerifyReport {
        let paths = store.all_paths();
        let mut report = VerifyReport {
            checked: paths.len(),
            removed: Vec::new(),
        };

        for path in paths {
            if !is_existing_dir(&path) {
                debug!("Pruning stale watched path: {path}");
                store.remove(&path);
                report.removed.push(path);
            }
        }

        if !report.removed.is_empty() {
            info!(
                "Integrity check removed {} of {} watched directories",
                report.removed.len(),
                report.checked
            );
        }

        report
    }
}
