//! Commands accepted from the host and events delivered back to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::ExtensionFilter;

/// Deduplicated absolute paths produced by one scan, in discovery order.
pub type ScanResult = Vec<String>;

/// A single request to update the watch list and optionally scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanCommand {
    /// Directories to start watching.
    pub add_paths: Vec<String>,

    /// Directories to stop watching.
    pub remove_paths: Vec<String>,

    /// Suffixes to match; absent means every file and directory.
    pub extension_filter: ExtensionFilter,

    /// Whether to scan after the watch list has been updated.
    pub should_scan: bool,
}

impl ScanCommand {
    /// Scan the current watch list without changing it.
    pub fn scan(filter: impl Into<ExtensionFilter>) -> Self {
        Self {
            extension_filter: filter.into(),
            should_scan: true,
            ..Self::default()
        }
    }

    /// Start watching `paths` without scanning.
    pub fn add<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_add(paths)
    }

    /// Stop watching `paths` without scanning.
    pub fn remove<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_remove(paths)
    }

    /// Also start watching `paths`.
    pub fn with_add<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Also stop watching `paths`.
    pub fn with_remove<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the extension filter.
    pub fn with_filter(mut self, filter: impl Into<ExtensionFilter>) -> Self {
        self.extension_filter = filter.into();
        self
    }

    /// Request a scan once the watch list is updated.
    pub fn and_scan(mut self) -> Self {
        self.should_scan = true;
        self
    }
}

/// Event emitted to the external listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// A scan finished.
    ScanCompleted {
        /// Every matched path, deduplicated.
        matched_paths: ScanResult,

        /// When the scan finished.
        timestamp: DateTime<Utc>,
    },
}

impl ScanEvent {
    /// Create a completion event stamped now.
    pub fn completed(matched_paths: ScanResult) -> Self {
        Self::ScanCompleted {
            matched_paths,
            timestamp: Utc::now(),
        }
    }

    /// Paths carried by the event.
    pub fn matched_paths(&self) -> &[String] {
        match self {
            Self::ScanCompleted { matched_paths, .. } => matched_paths,
        }
    }
}

/// In-process observer notified after each result event is emitted.
pub trait ResultListener: Send + Sync {
    /// Called on the scanning task with the delivered paths.
    fn on_results(&self, matched_paths: &[String]);
}

impl<F> ResultListener for F
where
    F: Fn(&[String]) + Send + Sync,
{
    fn on_results(&self, matched_paths: &[String]) {
        self(matched_paths)
    }
}
