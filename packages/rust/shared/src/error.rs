//! Error types for orphanscan.
//!
//! Library crates use [`OrphanScanError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type for all orphanscan operations.
#[derive(Debug, thiserror::Error)]
pub enum OrphanScanError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Snapshot or settings parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Result cache read/write error.
    #[error("cache error: {0}")]
    Cache(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unusable home URL, bad snapshot, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The link scan ran past its wall-clock budget. No partial result exists.
    #[error("link scan exceeded its time limit of {}s; retry or raise max_duration_secs", limit.as_secs())]
    ScanTimeout { limit: Duration },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OrphanScanError>;

impl OrphanScanError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether re-invoking the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ScanTimeout { .. } | Self::Storage(_) | Self::Cache(_))
    }
}
