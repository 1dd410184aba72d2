//! Error types for the file scanner.
//!
//! Only construction and configuration paths surface these. Store
//! mutations, integrity checks and scans absorb their failures locally.

use thiserror::Error;

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that can occur while setting up the scanner.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Home directory could not be resolved for the default store location.
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create the storage directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read the watch list document.
    #[error("failed to read file: {0}")]
    ReadFile(String),

    /// Failed to write the watch list document.
    #[error("failed to write file: {0}")]
    WriteFile(String),

    /// Failed to acquire the watch list lock file.
    #[error("failed to lock: {0}")]
    Lock(String),

    /// Watch list document is not in the expected format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}
