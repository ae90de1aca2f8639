//! Error types for synchronization.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a whole cycle or prevent startup.
///
/// Problems with a single entry are never raised as `SyncError`; they are
/// collected as [`EntryFailure`]s in the cycle report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source root does not exist.
    #[error("Source root not found: {path}")]
    SourceUnavailable { path: PathBuf },

    /// Source root exists but is not a directory.
    #[error("Source root is not a directory: {path}")]
    SourceNotADirectory { path: PathBuf },

    /// Permission denied for a tree root.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Replica root could not be created.
    #[error("Cannot create replica root {path}: {source}")]
    ReplicaRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tree root could not be enumerated.
    #[error("Cannot enumerate {path}: {message}")]
    Enumerate { path: PathBuf, message: String },

    /// Generic I/O error on a tree root.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl SyncError {
    /// Create an I/O error for a source root with path context.
    pub fn source_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::SourceUnavailable { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Errors that will not go away by waiting for the next cycle.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::SourceNotADirectory { .. } | Self::InvalidConfig { .. }
        )
    }
}

/// Stage of per-entry processing that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStage {
    /// A subdirectory or link could not be enumerated.
    Enumerate,
    /// Metadata lookup failed or the entry has an unexpected kind.
    Inspect,
    /// Reading content for fingerprinting failed.
    Fingerprint,
    /// A replica directory could not be created.
    CreateDirectory,
    /// Copying a file failed.
    Copy,
    /// Removing a replica file failed.
    Delete,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enumerate => write!(f, "enumerate"),
            Self::Inspect => write!(f, "inspect"),
            Self::Fingerprint => write!(f, "fingerprint"),
            Self::CreateDirectory => write!(f, "create directory"),
            Self::Copy => write!(f, "copy"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A recoverable failure on a single entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryFailure {
    /// Path of the entry, relative to the tree root.
    pub path: PathBuf,
    /// What was being attempted.
    pub stage: FailureStage,
    /// Human-readable message.
    pub message: String,
}

impl EntryFailure {
    /// Create a new entry failure.
    pub fn new(path: impl Into<PathBuf>, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stage,
            message: message.into(),
        }
    }

    /// Create an entry failure from an I/O error.
    pub fn io(path: impl Into<PathBuf>, stage: FailureStage, error: &std::io::Error) -> Self {
        Self::new(path, stage, error.to_string())
    }
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to {} {}: {}", self.stage, self.path.display(), self.message)
    }
}
