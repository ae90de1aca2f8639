//! Sync plan actions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// An action applied to the replica tree during a cycle.
///
/// Paths are relative to the tree roots. Actions live for one cycle only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    /// Create a missing replica directory (and its ancestors).
    MakeDirectory(PathBuf),
    /// Copy a source file that has no replica counterpart.
    CreateFile(PathBuf),
    /// Overwrite a replica file whose content differs from the source.
    UpdateFile(PathBuf),
    /// Remove a replica file that no longer exists in the source.
    DeleteFile(PathBuf),
}

/// Discriminant of a [`SyncAction`], used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    MakeDirectory,
    CreateFile,
    UpdateFile,
    DeleteFile,
}

impl SyncAction {
    /// Relative path the action targets.
    pub fn path(&self) -> &Path {
        match self {
            Self::MakeDirectory(p) | Self::CreateFile(p) | Self::UpdateFile(p) | Self::DeleteFile(p) => p,
        }
    }

    /// Kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::MakeDirectory(_) => ActionKind::MakeDirectory,
            Self::CreateFile(_) => ActionKind::CreateFile,
            Self::UpdateFile(_) => ActionKind::UpdateFile,
            Self::DeleteFile(_) => ActionKind::DeleteFile,
        }
    }

    /// Whether the action copies file content.
    pub fn is_copy(&self) -> bool {
        matches!(self, Self::CreateFile(_) | Self::UpdateFile(_))
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MakeDirectory => write!(f, "Creating directory"),
            Self::CreateFile => write!(f, "Creating file"),
            Self::UpdateFile => write!(f, "Updating file"),
            Self::DeleteFile => write!(f, "Removing file"),
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.path().display())
    }
}
