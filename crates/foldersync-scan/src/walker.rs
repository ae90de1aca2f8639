//! JWalk-based pre-order tree walker.

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

use foldersync_core::{EntryFailure, FailureStage, SyncError, TreeEntry};

/// Entries of one tree, enumerated fresh for a single cycle.
#[derive(Debug, Clone)]
pub struct TreeListing {
    root: PathBuf,
    /// Entries in pre-order: every directory precedes its contents.
    pub entries: Vec<TreeEntry>,
    /// Subtrees and links that could not be enumerated.
    pub failures: Vec<EntryFailure>,
}

impl TreeListing {
    /// Root the entries are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Iterate over directory entries, root included.
    pub fn directories(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| e.is_dir())
    }

    /// Iterate over file entries.
    pub fn files(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| e.is_file())
    }

    /// Number of file entries.
    pub fn file_count(&self) -> usize {
        self.files().count()
    }
}

/// Serial, sorted walker over a directory tree.
///
/// By default symbolic links are followed and reported as whatever they
/// point to. With `follow_links(false)` a link is never traversed and is
/// reported as a file entry of its own, so callers act on the link rather
/// than its target.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    follow_links: bool,
}

impl TreeWalker {
    /// Create a walker that follows symbolic links.
    pub fn new() -> Self {
        Self { follow_links: true }
    }

    /// Set whether symbolic links are followed.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Enumerate `root` and everything below it.
    ///
    /// Fails only when the root itself cannot be read; problems below the
    /// root are collected in [`TreeListing::failures`].
    pub fn walk(&self, root: &Path) -> Result<TreeListing, SyncError> {
        let metadata = fs::metadata(root).map_err(|e| enumerate_error(root, &e))?;
        if !metadata.is_dir() {
            return Err(SyncError::Enumerate {
                path: root.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }
        // jwalk reports an unreadable root as an ordinary entry error.
        fs::read_dir(root).map_err(|e| enumerate_error(root, &e))?;

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(self.follow_links)
            .min_depth(0);

        let mut entries = Vec::new();
        let mut failures = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| relative_to(root, p))
                        .unwrap_or_default();
                    failures.push(EntryFailure::new(path, FailureStage::Enumerate, err.to_string()));
                    continue;
                }
            };

            let path = entry.path();
            let relative = relative_to(root, &path);
            let depth = entry.depth();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                entries.push(TreeEntry::directory(relative, depth));
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(metadata) => entries.push(TreeEntry::file(relative, metadata.len(), depth)),
                    Err(err) => {
                        failures.push(EntryFailure::new(relative, FailureStage::Enumerate, err.to_string()))
                    }
                }
            } else if file_type.is_symlink() && !self.follow_links {
                let size = fs::symlink_metadata(&path).map(|m| m.len()).unwrap_or(0);
                entries.push(TreeEntry::file(relative, size, depth));
            } else if file_type.is_symlink() {
                // Followed links resolve to their target; one left here is dangling.
                let target = fs::read_link(&path)
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default();
                failures.push(EntryFailure::new(
                    relative,
                    FailureStage::Enumerate,
                    format!("broken symlink -> {target}"),
                ));
            } else {
                tracing::debug!(path = %path.display(), "skipping special file");
            }
        }

        Ok(TreeListing {
            root: root.to_path_buf(),
            entries,
            failures,
        })
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn enumerate_error(root: &Path, error: &std::io::Error) -> SyncError {
    SyncError::Enumerate {
        path: root.to_path_buf(),
        message: error.to_string(),
    }
}
