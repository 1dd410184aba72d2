//! Recursive, filter-driven directory scanning.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::filter::ExtensionFilter;
use crate::verify::absolute_path;

/// Options controlling a directory walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Whether to follow symbolic links. Link loops are skipped.
    pub follow_symlinks: bool,

    /// Maximum depth below the root (None = unlimited).
    pub max_depth: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            max_depth: None,
        }
    }
}

/// Walks a directory tree collecting entries that pass an extension filter.
#[derive(Debug, Clone, Default)]
pub struct DirectoryScanner {
    options: ScanOptions,
}

impl DirectoryScanner {
    /// Create a new scanner.
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Walk options in use.
    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Scan `root` recursively and return the absolute path of every match.
    ///
    /// Subdirectories are always descended into, whether or not they match.
    /// Anything that cannot be listed contributes nothing and the walk goes
    /// on. A root that is missing or not a directory yields no matches.
    pub fn scan(&self, root: impl AsRef<Path>, filter: &ExtensionFilter) -> Vec<String> {
        let root = root.as_ref();
        if !root.is_dir() {
            debug!("Skipping scan of non-directory root: {}", root.display());
            return Vec::new();
        }

        let root = absolute_path(root);
        let start = Instant::now();
        let mut matches = Vec::new();

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(self.options.follow_symlinks)
            .max_depth(self.options.max_depth.unwrap_or(usize::MAX));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };

            if filter.matches(entry.path(), entry.file_type()) {
                matches.push(entry.path().to_string_lossy().into_owned());
            }
        }

        info!(
            "Scanned {} in {:?} ({} matches)",
            root.display(),
            start.elapsed(),
            matches.len()
        );

        matches
    }

    /// Scan each root in order and concatenate the matches.
    ///
    /// No deduplication happens here; overlapping roots report shared
    /// entries once per root.
    pub fn scan_roots<I, P>(&self, roots: I, filter: &ExtensionFilter) -> Vec<String>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        roots
            .into_iter()
            .flat_map(|root| self.scan(root, filter))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn sorted(paths: Vec<String>) -> BTreeSet<String> {
        paths.into_iter().collect()
    }

    fn abs(root: &Path, rel: &str) -> String {
        root.join(rel).to_string_lossy().into_owned()
    }

    /// root/{a.txt, b.md, c.png, sub/d.txt, sub/deeper/e.md}
    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("b.md"), b"b").unwrap();
        fs::write(root.join("c.png"), b"c").unwrap();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("sub/d.txt"), b"d").unwrap();
        fs::write(root.join("sub/deeper/e.md"), b"e").unwrap();
        temp_dir
    }

    #[test]
    fn test_scan_with_extension_filter() {
        let temp_dir = fixture();
        let root = temp_dir.path();
        let scanner = DirectoryScanner::default();

        let found = scanner.scan(root, &ExtensionFilter::extensions([".txt"]));
        assert_eq!(
            sorted(found),
            sorted(vec![abs(root, "a.txt"), abs(root, "sub/d.txt")])
        );

        let found = scanner.scan(root, &ExtensionFilter::extensions([".txt", ".md"]));
        assert_eq!(
            sorted(found),
            sorted(vec![
                abs(root, "a.txt"),
                abs(root, "b.md"),
                abs(root, "sub/d.txt"),
                abs(root, "sub/deeper/e.md"),
            ])
        );
    }

    #[test]
    fn test_scan_without_filter_returns_files_and_directories() {
        let temp_dir = fixture();
        let root = temp_dir.path();

        let found = DirectoryScanner::default().scan(root, &ExtensionFilter::any());
        assert_eq!(found.len(), 7);
        assert_eq!(
            sorted(found),
            sorted(vec![
                abs(root, "a.txt"),
                abs(root, "b.md"),
                abs(root, "c.png"),
                abs(root, "sub"),
                abs(root, "sub/d.txt"),
                abs(root, "sub/deeper"),
                abs(root, "sub/deeper/e.md"),
            ])
        );
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let temp_dir = fixture();
        let found = DirectoryScanner::default()
            .scan(temp_dir.path(), &ExtensionFilter::extensions(Vec::<String>::new()));
        assert!(found.is_empty());
    }

    #[test]
    fn test_missing_or_file_root_yields_nothing() {
        let temp_dir = fixture();
        let scanner = DirectoryScanner::default();

        assert!(
            scanner
                .scan(temp_dir.path().join("missing"), &ExtensionFilter::any())
                .is_empty()
        );
        assert!(
            scanner
                .scan(temp_dir.path().join("a.txt"), &ExtensionFilter::any())
                .is_empty()
        );
    }

    #[test]
    fn test_max_depth_limits_recursion() {
        let temp_dir = fixture();
        let root = temp_dir.path();
        let scanner = DirectoryScanner::new(ScanOptions {
            max_depth: Some(1),
            ..ScanOptions::default()
        });

        let found = scanner.scan(root, &ExtensionFilter::extensions([".txt"]));
        assert_eq!(found, vec![abs(root, "a.txt")]);
    }

    #[test]
    fn test_scan_roots_concatenates_without_dedup() {
        let temp_dir = fixture();
        let root = temp_dir.path();
        let sub = root.join("sub");
        let scanner = DirectoryScanner::default();

        let found = scanner.scan_roots([root, sub.as_path()], &ExtensionFilter::extensions([".txt"]));
        assert_eq!(found.len(), 3);
        assert_eq!(
            found.iter().filter(|p| **p == abs(root, "sub/d.txt")).count(),
            2
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = fixture();
        let root = temp_dir.path();
        let locked = root.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), b"h").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let found = DirectoryScanner::default().scan(root, &ExtensionFilter::extensions([".txt"]));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Root can read anything; only assert the walk itself survived.
        assert!(found.contains(&abs(root, "a.txt")));
        assert!(found.contains(&abs(root, "sub/d.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_terminates() {
        let temp_dir = fixture();
        let root = temp_dir.path();
        std::os::unix::fs::symlink(root, root.join("sub/loop")).unwrap();

        let found = DirectoryScanner::default().scan(root, &ExtensionFilter::extensions([".md"]));
        assert_eq!(
            sorted(found),
            sorted(vec![abs(root, "b.md"), abs(root, "sub/deeper/e.md")])
        );
    }
}
