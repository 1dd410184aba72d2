//! Configuration types for the scanner.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::scanner::ScanOptions;

/// Name of the directory (under the home directory) holding the watch list.
pub const DEFAULT_STORE_DIR: &str = ".extscan";

/// Configuration for the scan coordinator and its store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Directory holding the persisted watch list.
    pub store_dir: PathBuf,

    /// Whether to follow symbolic links while walking.
    pub follow_symlinks: bool,

    /// Maximum depth to recurse below each watched root (None = unlimited).
    pub max_depth: Option<usize>,

    /// Scan independent watched roots on separate blocking tasks.
    pub parallel_roots: bool,

    /// Capacity of the result event channel.
    pub event_buffer: usize,
}

impl ScannerConfig {
    /// Create a new config storing the watch list in `store_dir`.
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            follow_symlinks: true,
            max_depth: None,
            parallel_roots: true,
            event_buffer: 16,
        }
    }

    /// Set the store directory.
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    /// Set the maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Do not follow symbolic links.
    pub fn no_follow_symlinks(mut self) -> Self {
        self.follow_symlinks = false;
        self
    }

    /// Scan watched roots one after another on a single blocking task.
    pub fn sequential(mut self) -> Self {
        self.parallel_roots = false;
        self
    }

    /// Load a config from a TOML file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(ScanError::Config)?;
        debug!("Loaded scanner config from {}", path.display());
        Ok(config)
    }

    /// Walk options derived from this config.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            follow_symlinks: self.follow_symlinks,
            max_depth: self.max_depth,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::new(dirs::home_dir().unwrap_or_default().join(DEFAULT_STORE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_config_builder() {
        let config = ScannerConfig::new("/tmp/extscan")
            .with_max_depth(3)
            .no_follow_symlinks()
            .sequential();

        assert_eq!(config.store_dir, Path::new("/tmp/extscan"));
        assert_eq!(config.max_depth, Some(3));
        assert!(!config.follow_symlinks);
        assert!(!config.parallel_roots);

        let options = config.scan_options();
        assert_eq!(options.max_depth, Some(3));
        assert!(!options.follow_symlinks);
    }

    #[test]
    fn test_load_partial_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("extscan.toml");
        fs::write(&path, "store_dir = \"/var/lib/extscan\"\nmax_depth = 2\n").unwrap();

        let config = ScannerConfig::load(&path).unwrap();
        assert_eq!(config.store_dir, Path::new("/var/lib/extscan"));
        assert_eq!(config.max_depth, Some(2));
        assert!(config.follow_symlinks);
        assert!(config.parallel_roots);
        assert_eq!(config.event_buffer, 16);
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("extscan.toml");
        fs::write(&path, "max_depth = \"deep\"").unwrap();

        assert!(matches!(ScannerConfig::load(&path), Err(ScanError::Config(_))));
    }
}
