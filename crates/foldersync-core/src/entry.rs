//! Tree entry and fingerprint types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 32-byte BLAKE3 digest of a file's full content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Create a new Fingerprint from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Short hex prefix for log lines.
    pub fn short_hex(&self) -> String {
        self.0[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Directory,
    File,
}

/// A single file or directory found while enumerating a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the tree root. Empty for the root itself.
    pub relative: PathBuf,
    /// Entry kind.
    pub kind: EntryKind,
    /// Size in bytes at enumeration time (0 for directories).
    pub size: u64,
    /// Depth below the root (root = 0).
    pub depth: usize,
}

impl TreeEntry {
    /// Create a directory entry.
    pub fn directory(relative: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            relative: relative.into(),
            kind: EntryKind::Directory,
            size: 0,
            depth,
        }
    }

    /// Create a file entry.
    pub fn file(relative: impl Into<PathBuf>, size: u64, depth: usize) -> Self {
        Self {
            relative: relative.into(),
            kind: EntryKind::File,
            size,
            depth,
        }
    }

    /// Check if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Check if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Check if this entry is the tree root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Resolve this entry against a tree root.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        if self.relative.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(&self.relative)
        }
    }
}
