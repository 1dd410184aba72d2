//! Orchestration of watch list updates, verification and scanning.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task;
use tracing::{debug, error, info, warn};

use crate::config::ScannerConfig;
use crate::event::{ResultListener, ScanCommand, ScanEvent, ScanResult};
use crate::filter::ExtensionFilter;
use crate::scanner::{DirectoryScanner, ScanOptions};
use crate::store::WatchListStore;
use crate::verify::{IntegrityVerifier, absolute_path, is_existing_dir};

/// Phases of a single `process` invocation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Applying removals then additions to the store.
    Updating,
    /// Pruning stale watched paths.
    Verifying,
    /// Walking every surviving root.
    Scanning,
    /// Emitting the result event and notifying listeners.
    Delivering,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Updating => "updating",
            Self::Verifying => "verifying",
            Self::Scanning => "scanning",
            Self::Delivering => "delivering",
        };
        f.write_str(name)
    }
}

/// Options for the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorOptions {
    /// Walk options passed to the scanner.
    pub scan: ScanOptions,

    /// Scan roots on separate blocking tasks.
    pub parallel_roots: bool,

    /// Capacity of the result event channel.
    pub event_buffer: usize,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            parallel_roots: true,
            event_buffer: 16,
        }
    }
}

impl From<&ScannerConfig> for CoordinatorOptions {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            scan: config.scan_options(),
            parallel_roots: config.parallel_roots,
            event_buffer: config.event_buffer,
        }
    }
}

/// Applies watch list commands and delivers scan results.
///
/// Each call to [`ScanCoordinator::process`] runs remove, add, verify and
/// (optionally) scan strictly in that order. Overlapping calls are allowed;
/// the store serializes its own operations and each scan emits its own event.
/// Delivery never waits on the event receiver: when the channel buffer is
/// full the event is dropped with a warning, and listeners still run.
pub struct ScanCoordinator {
    /// Watched directories.
    store: Arc<dyn WatchListStore>,

    /// Directory walker.
    scanner: DirectoryScanner,

    /// Scan roots concurrently.
    parallel_roots: bool,

    /// Event sender for the external listener.
    event_tx: mpsc::Sender<ScanEvent>,

    /// In-process observers.
    listeners: RwLock<Vec<Arc<dyn ResultListener>>>,
}

impl ScanCoordinator {
    /// Create a coordinator and the receiver its result events go to.
    pub fn new(
        store: Arc<dyn WatchListStore>,
        options: CoordinatorOptions,
    ) -> (Self, mpsc::Receiver<ScanEvent>) {
        let (event_tx, event_rx) = mpsc::channel(options.event_buffer.max(1));

        let coordinator = Self {
            store,
            scanner: DirectoryScanner::new(options.scan),
            parallel_roots: options.parallel_roots,
            event_tx,
            listeners: RwLock::new(Vec::new()),
        };

        (coordinator, event_rx)
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn WatchListStore> {
        &self.store
    }

    /// Register an observer called after every delivered result.
    pub fn add_listener(&self, listener: Arc<dyn ResultListener>) {
        self.listeners.write().push(listener);
    }

    /// Run one command to completion.
    ///
    /// Returns `None` when no scan was requested. Otherwise returns the
    /// deduplicated matches, which have already been sent as a
    /// [`ScanEvent::ScanCompleted`] and passed to every listener.
    pub async fn process(&self, command: ScanCommand) -> Option<ScanResult> {
        let ScanCommand {
            add_paths,
            remove_paths,
            extension_filter,
            should_scan,
        } = command;

        debug!(phase = %ScanPhase::Updating, "Processing scan command");
        for path in &remove_paths {
            if !path.is_empty() {
                self.store.remove(&watched_path(path));
            }
        }
        for path in &add_paths {
            self.add_watched(path);
        }

        debug!(phase = %ScanPhase::Verifying, "Verifying watch list");
        IntegrityVerifier::verify(self.store.as_ref());

        if !should_scan {
            return None;
        }

        let roots = self.store.all_paths();
        debug!(phase = %ScanPhase::Scanning, roots = roots.len(), "Scanning watched directories");
        let matches = self.scan_all(roots, extension_filter).await;
        let result = dedup(matches);

        debug!(phase = %ScanPhase::Delivering, matches = result.len(), "Delivering results");
        self.deliver(&result);

        Some(result)
    }

    /// Insert the absolute form of `path` if it currently resolves to a directory.
    fn add_watched(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        if !is_existing_dir(path) {
            debug!("Not watching {path}: not an existing directory");
            return;
        }
        let path = watched_path(path);
        if !self.store.contains(&path) {
            info!("Watching directory: {path}");
            self.store.insert(&path);
        }
    }

    async fn scan_all(&self, roots: Vec<String>, filter: ExtensionFilter) -> Vec<String> {
        if roots.is_empty() {
            return Vec::new();
        }

        if !self.parallel_roots {
            let scanner = self.scanner.clone();
            return match task::spawn_blocking(move || scanner.scan_roots(&roots, &filter)).await {
                Ok(matches) => matches,
                Err(e) => {
                    error!("Scan task failed: {e}");
                    Vec::new()
                }
            };
        }

        let filter = Arc::new(filter);
        let handles: Vec<_> = roots
            .into_iter()
            .map(|root| {
                let scanner = self.scanner.clone();
                let filter = Arc::clone(&filter);
                task::spawn_blocking(move || scanner.scan(&root, &filter))
            })
            .collect();

        // Joined in root order so the merge is stable for a given listing.
        let mut matches = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(found) => matches.extend(found),
                Err(e) => error!("Scan task failed: {e}"),
            }
        }
        matches
    }

    /// Never waits on the event channel: a full buffer drops the event.
    fn deliver(&self, result: &[String]) {
        match self.event_tx.try_send(ScanEvent::completed(result.to_vec())) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    matches = result.len(),
                    "Scan result channel is full; event dropped"
                );
            }
            Err(TrySendError::Closed(_)) => {
                debug!("No receiver for scan results; event dropped");
            }
        }

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_results(result);
        }
    }
}

/// Key under which `path` is stored: resolved against the current directory.
fn watched_path(path: &str) -> String {
    absolute_path(Path::new(path)).to_string_lossy().into_owned()
}

/// Drop repeated paths, keeping the first occurrence of each.
fn dedup(paths: Vec<String>) -> ScanResult {
    paths.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}
