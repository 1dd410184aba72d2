//! # File Scanner
//!
//! This crate keeps a persistent list of watched directories and, on demand,
//! walks them to find files whose names end with one of a set of extensions.
//!
//! ## Features
//!
//! - **Watch List**: Durable, duplicate-free set of directory paths
//! - **Integrity Checks**: Stale or non-directory entries are pruned before every scan
//! - **Filtered Scans**: Recursive walks selecting files by name suffix
//! - **Result Delivery**: One deduplicated result event per scan, plus in-process listeners
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Scan Coordinator                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ScanCommand ──► WatchListStore ──► IntegrityVerifier          │
//! │                                           │                     │
//! │                                           ▼                     │
//! │  ScanEvent ◄── dedup ◄── DirectoryScanner (per watched root)   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use extscan_file_scanner::{
//!     CoordinatorOptions, JsonWatchListStore, ScanCommand, ScanCoordinator,
//! };
//!
//! let store = Arc::new(JsonWatchListStore::default_location()?);
//! let (coordinator, mut events) = ScanCoordinator::new(store, CoordinatorOptions::default());
//!
//! let command = ScanCommand::add(["/home/user/Music"])
//!     .with_filter(vec![".mp3".to_string()])
//!     .and_scan();
//! let matches = coordinator.process(command).await;
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod filter;
pub mod scanner;
pub mod store;
pub mod verify;

pub use config::ScannerConfig;
pub use coordinator::{CoordinatorOptions, ScanCoordinator, ScanPhase};
pub use error::{Result, ScanError, StorageError};
pub use event::{ResultListener, ScanCommand, ScanEvent, ScanResult};
pub use filter::ExtensionFilter;
pub use scanner::{DirectoryScanner, ScanOptions};
pub use store::{JsonWatchListStore, MemoryWatchListStore, WatchListStore, WatchedDirectory};
pub use verify::{IntegrityVerifier, VerifyReport, is_existing_dir};
