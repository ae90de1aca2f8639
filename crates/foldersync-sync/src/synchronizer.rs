//! Two-phase source to replica synchronization.
//!
//! A cycle runs in two strictly ordered phases:
//!
//! 1. **Propagate** walks the source tree in pre-order. Every directory is
//!    created in the replica before anything inside it is touched; every
//!    file is copied when the replica lacks it or holds different content.
//! 2. **Prune** walks the replica tree and removes files the source no
//!    longer has. Directories are never removed, even when pruning leaves
//!    them empty.
//!
//! Prune only starts after propagate has finished, so a file moved within
//! the source is always copied to its new location before the old copy is
//! removed.
//!
//! Symbolic links in the source are followed. Symbolic links in the replica
//! never are: a link is replaced or removed like a file, and nothing outside
//! the replica root is read, written or deleted through it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use foldersync_core::{
    EntryFailure, EntryKind, FailureStage, Fingerprint, SyncAction, SyncConfig, SyncError, SyncReport,
    TreeEntry,
};
use foldersync_scan::{ContentHasher, Fingerprinter, TreeListing, TreeWalker};

use crate::logger::SyncLogger;
use crate::ops;

/// Makes a replica tree match a source tree, one cycle at a time.
///
/// Holds no state between cycles; both trees are enumerated afresh on every
/// call to [`Synchronizer::synchronize`].
pub struct Synchronizer {
    source: PathBuf,
    replica: PathBuf,
    source_walker: TreeWalker,
    replica_walker: TreeWalker,
    hasher: Arc<dyn ContentHasher>,
    compare_sizes_first: bool,
    logger: Arc<dyn SyncLogger>,
}

impl Synchronizer {
    /// Create a synchronizer for the roots named in `config`.
    pub fn new(config: &SyncConfig, logger: Arc<dyn SyncLogger>) -> Self {
        Self {
            source: config.source.clone(),
            replica: config.replica.clone(),
            source_walker: TreeWalker::new(),
            replica_walker: TreeWalker::new().follow_links(false),
            hasher: Arc::new(Fingerprinter::with_chunk_size(config.chunk_size)),
            compare_sizes_first: config.compare_sizes_first,
            logger,
        }
    }

    /// Compare file content with `hasher` instead of the default fingerprinter.
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Run one full cycle.
    ///
    /// Returns `Err` only for structural problems with the roots; in that
    /// case nothing is pruned. Cancellation is checked between entries, and
    /// a cycle cancelled during propagation skips pruning entirely.
    pub fn synchronize(&self, cancel: &CancellationToken) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        let mut report = SyncReport::new();

        self.check_source_root()?;
        self.ensure_replica_root(&mut report)?;

        let source_listing = self.source_walker.walk(&self.source)?;
        self.record_listing_failures(&source_listing, &mut report);
        self.propagate(&source_listing, cancel, &mut report);

        if cancel.is_cancelled() {
            report.cancelled = true;
        }
        if !report.cancelled {
            let replica_listing = self.replica_walker.walk(&self.replica)?;
            self.record_listing_failures(&replica_listing, &mut report);
            self.prune(&replica_listing, cancel, &mut report);
        }

        report.duration = start.elapsed();
        Ok(report)
    }

    fn check_source_root(&self) -> Result<(), SyncError> {
        let metadata = fs::metadata(&self.source).map_err(|e| SyncError::source_io(&self.source, e))?;
        if !metadata.is_dir() {
            return Err(SyncError::SourceNotADirectory {
                path: self.source.clone(),
            });
        }
        Ok(())
    }

    fn ensure_replica_root(&self, report: &mut SyncReport) -> Result<(), SyncError> {
        match ops::ensure_directory(&self.replica) {
            Ok(true) => {
                self.logger
                    .info(&format!("Creating directory: {}", self.replica.display()));
                report.record_action(SyncAction::MakeDirectory(PathBuf::new()));
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(source) => Err(SyncError::ReplicaRoot {
                path: self.replica.clone(),
                source,
            }),
        }
    }

    fn record_listing_failures(&self, listing: &TreeListing, report: &mut SyncReport) {
        for failure in &listing.failures {
            self.fail(report, failure.clone());
        }
    }

    /// Phase 1: create missing directories, copy new and changed files.
    fn propagate(&self, listing: &TreeListing, cancel: &CancellationToken, report: &mut SyncReport) {
        // Directories that could not be created; their contents are skipped.
        let mut blocked: Vec<&Path> = Vec::new();

        for entry in listing.entries.iter().filter(|e| !e.is_root()) {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return;
            }
            if blocked.iter().any(|dir| entry.relative.starts_with(dir)) {
                continue;
            }

            match entry.kind {
                EntryKind::Directory => match self.sync_directory(entry) {
                    Ok(Some(action)) => report.record_action(action),
                    Ok(None) => {}
                    Err(failure) => {
                        blocked.push(&entry.relative);
                        self.fail(report, failure);
                    }
                },
                EntryKind::File => match self.plan_file(entry) {
                    Ok(Some(action)) => self.apply_copy(action, report),
                    Ok(None) => {}
                    Err(failure) => self.fail(report, failure),
                },
            }
        }
    }

    /// Phase 2: remove replica files the source no longer has.
    fn prune(&self, listing: &TreeListing, cancel: &CancellationToken, report: &mut SyncReport) {
        for entry in listing.files() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return;
            }

            match self.plan_prune(entry) {
                Ok(Some(action)) => self.apply_delete(action, report),
                Ok(None) => {}
                Err(failure) => self.fail(report, failure),
            }
        }
    }

    fn sync_directory(&self, entry: &TreeEntry) -> Result<Option<SyncAction>, EntryFailure> {
        let target = entry.resolve(&self.replica);
        ops::remove_symlink(&target)
            .map_err(|e| EntryFailure::io(&entry.relative, FailureStage::CreateDirectory, &e))?;
        match ops::ensure_directory(&target) {
            Ok(true) => {
                self.logger
                    .info(&format!("Creating directory: {}", target.display()));
                Ok(Some(SyncAction::MakeDirectory(entry.relative.clone())))
            }
            Ok(false) => Ok(None),
            Err(e) => Err(EntryFailure::io(&entry.relative, FailureStage::CreateDirectory, &e)),
        }
    }

    /// Decide whether a source file needs copying.
    fn plan_file(&self, entry: &TreeEntry) -> Result<Option<SyncAction>, EntryFailure> {
        let relative = &entry.relative;
        let source_path = entry.resolve(&self.source);
        let replica_path = entry.resolve(&self.replica);

        let replica_meta = match fs::symlink_metadata(&replica_path) {
            Ok(m) => m,
            Err(e) if is_absent(&e) => return Ok(Some(SyncAction::CreateFile(relative.clone()))),
            Err(e) => return Err(EntryFailure::io(relative, FailureStage::Inspect, &e)),
        };
        if replica_meta.file_type().is_symlink() {
            return Ok(Some(SyncAction::UpdateFile(relative.clone())));
        }
        if replica_meta.is_dir() {
            return Err(EntryFailure::new(
                relative,
                FailureStage::Inspect,
                "replica holds a directory where the source has a file",
            ));
        }

        if self.compare_sizes_first {
            let source_meta =
                fs::metadata(&source_path).map_err(|e| EntryFailure::io(relative, FailureStage::Inspect, &e))?;
            if source_meta.len() != replica_meta.len() {
                return Ok(Some(SyncAction::UpdateFile(relative.clone())));
            }
        }

        let source_fp = self.fingerprint(relative, &source_path)?;
        let replica_fp = self.fingerprint(relative, &replica_path)?;

        if source_fp == replica_fp {
            self.logger.debug(&format!(
                "Unchanged: {} ({})",
                relative.display(),
                source_fp.short_hex()
            ));
            Ok(None)
        } else {
            Ok(Some(SyncAction::UpdateFile(relative.clone())))
        }
    }

    fn fingerprint(&self, relative: &Path, path: &Path) -> Result<Fingerprint, EntryFailure> {
        self.hasher.hash_file(path).map_err(|e| {
            EntryFailure::new(relative, FailureStage::Fingerprint, format!("{}: {e}", path.display()))
        })
    }

    /// Decide whether a replica file should be removed.
    fn plan_prune(&self, entry: &TreeEntry) -> Result<Option<SyncAction>, EntryFailure> {
        let source_path = entry.resolve(&self.source);
        match fs::metadata(&source_path) {
            Ok(metadata) if metadata.is_file() => Ok(None),
            Ok(_) => Ok(Some(SyncAction::DeleteFile(entry.relative.clone()))),
            Err(e) if is_absent(&e) => Ok(Some(SyncAction::DeleteFile(entry.relative.clone()))),
            // Unknown is not absent: keep the replica copy.
            Err(e) => Err(EntryFailure::new(
                &entry.relative,
                FailureStage::Inspect,
                format!("{}: {e}", source_path.display()),
            )),
        }
    }

    fn apply_copy(&self, action: SyncAction, report: &mut SyncReport) {
        let source_path = self.source.join(action.path());
        let replica_path = self.replica.join(action.path());

        self.logger
            .info(&format!("{}: {}", action.kind(), replica_path.display()));

        match ops::copy_file(&source_path, &replica_path) {
            Ok(bytes) => report.record_copy(action, bytes),
            Err(e) => {
                let failure = EntryFailure::new(
                    action.path(),
                    FailureStage::Copy,
                    format!("{} -> {}: {e}", source_path.display(), replica_path.display()),
                );
                self.fail(report, failure);
            }
        }
    }

    fn apply_delete(&self, action: SyncAction, report: &mut SyncReport) {
        let replica_path = self.replica.join(action.path());

        match ops::remove_file(&replica_path) {
            Ok(true) => {
                self.logger
                    .info(&format!("{}: {}", action.kind(), replica_path.display()));
                report.record_action(action);
            }
            Ok(false) => {
                self.logger
                    .debug(&format!("Already removed: {}", replica_path.display()));
            }
            Err(e) => self.fail(report, EntryFailure::io(action.path(), FailureStage::Delete, &e)),
        }
    }

    fn fail(&self, report: &mut SyncReport, failure: EntryFailure) {
        self.logger.error(&failure.to_string());
        report.record_failure(failure);
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("source", &self.source)
            .field("replica", &self.replica)
            .field("compare_sizes_first", &self.compare_sizes_first)
            .finish_non_exhaustive()
    }
}

/// Lookups that prove nothing exists at the path.
fn is_absent(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogLevel, MemoryLogger};
    use foldersync_core::ActionKind;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        source: PathBuf,
        replica: PathBuf,
        logger: Arc<MemoryLogger>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let source = temp.path().join("source");
            let replica = temp.path().join("replica");
            fs::create_dir(&source).unwrap();
            Self {
                _temp: temp,
                source,
                replica,
                logger: Arc::new(MemoryLogger::new()),
            }
        }

        fn synchronizer(&self) -> Synchronizer {
            Synchronizer::new(&SyncConfig::new(&self.source, &self.replica), self.logger.clone())
        }

        fn run(&self) -> SyncReport {
            self.synchronizer().synchronize(&CancellationToken::new()).unwrap()
        }
    }

    #[test]
    fn test_replica_root_created() {
        let fx = Fixture::new();
        let report = fx.run();

        assert!(fx.replica.is_dir());
        assert_eq!(report.actions, vec![SyncAction::MakeDirectory(PathBuf::new())]);
        assert!(fx.logger.contains(LogLevel::Info, "Creating directory"));
    }

    #[test]
    fn test_same_size_different_content_is_updated() {
        let fx = Fixture::new();
        fs::create_dir(&fx.replica).unwrap();
        fs::write(fx.source.join("a.txt"), "abc").unwrap();
        fs::write(fx.replica.join("a.txt"), "xyz").unwrap();

        let report = fx.run();

        assert_eq!(report.actions, vec![SyncAction::UpdateFile(PathBuf::from("a.txt"))]);
        assert_eq!(fs::read_to_string(fx.replica.join("a.txt")).unwrap(), "abc");
    }

    #[test]
    fn test_size_check_disabled_still_updates() {
        let fx = Fixture::new();
        fs::create_dir(&fx.replica).unwrap();
        fs::write(fx.source.join("a.txt"), "longer content").unwrap();
        fs::write(fx.replica.join("a.txt"), "short").unwrap();

        let config = SyncConfig::builder()
            .source(&fx.source)
            .replica(&fx.replica)
            .compare_sizes_first(false)
            .build()
            .unwrap();
        let report = Synchronizer::new(&config, fx.logger.clone())
            .synchronize(&CancellationToken::new())
            .unwrap();

        assert_eq!(report.count(ActionKind::UpdateFile), 1);
        assert_eq!(fs::read_to_string(fx.replica.join("a.txt")).unwrap(), "longer content");
    }

    #[test]
    fn test_missing_source_root_is_structural() {
        let fx = Fixture::new();
        fs::remove_dir(&fx.source).unwrap();
        fs::create_dir(&fx.replica).unwrap();
        fs::write(fx.replica.join("keep.txt"), "data").unwrap();

        let err = fx
            .synchronizer()
            .synchronize(&CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
        // Nothing is pruned when the source cannot be read.
        assert!(fx.replica.join("keep.txt").exists());
    }

    #[test]
    fn test_source_file_root_is_structural() {
        let fx = Fixture::new();
        fs::remove_dir(&fx.source).unwrap();
        fs::write(&fx.source, "not a dir").unwrap();

        let err = fx
            .synchronizer()
            .synchronize(&CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::SourceNotADirectory { .. }));
    }

    #[test]
    fn test_replica_root_blocked_by_file() {
        let fx = Fixture::new();
        fs::write(&fx.replica, "in the way").unwrap();

        let err = fx
            .synchronizer()
            .synchronize(&CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::ReplicaRoot { .. }));
    }

    #[test]
    fn test_blocked_directory_skips_descendants() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.source.join("dir1/sub")).unwrap();
        fs::write(fx.source.join("dir1/sub/a.txt"), "a").unwrap();
        fs::write(fx.source.join("top.txt"), "t").unwrap();
        fs::create_dir(&fx.replica).unwrap();
        fs::write(fx.replica.join("dir1"), "file where a dir belongs").unwrap();

        let report = fx.run();

        // One failure for dir1, nothing for its contents.
        let propagate_failures: Vec<_> = report
            .failures
            .iter()
            .filter(|f| f.stage == FailureStage::CreateDirectory)
            .collect();
        assert_eq!(propagate_failures.len(), 1);
        assert_eq!(propagate_failures[0].path, PathBuf::from("dir1"));
        assert!(fs::read_to_string(fx.replica.join("top.txt")).is_ok());
    }

    #[test]
    fn test_cancelled_before_start_skips_prune() {
        let fx = Fixture::new();
        fs::create_dir(&fx.replica).unwrap();
        fs::write(fx.source.join("a.txt"), "a").unwrap();
        fs::write(fx.replica.join("stale.txt"), "y").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = fx.synchronizer().synchronize(&cancel).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.actions_applied(), 0);
        assert!(fx.replica.join("stale.txt").exists());
        assert!(!fx.replica.join("a.txt").exists());
    }

    #[test]
    fn test_directory_in_replica_where_source_has_file() {
        let fx = Fixture::new();
        fs::write(fx.source.join("b.txt"), "b").unwrap();
        fs::create_dir_all(fx.replica.join("b.txt")).unwrap();

        let report = fx.run();

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::Inspect);
        assert!(fx.logger.contains(LogLevel::Error, "b.txt"));
    }

    #[test]
    fn test_replica_file_where_source_has_directory_is_pruned() {
        let fx = Fixture::new();
        fs::create_dir(fx.source.join("x")).unwrap();
        fs::create_dir(&fx.replica).unwrap();
        fs::write(fx.replica.join("x"), "old file").unwrap();

        let first = fx.run();
        assert_eq!(first.count(ActionKind::DeleteFile), 1);
        assert!(!fx.replica.join("x").exists());

        let second = fx.run();
        assert_eq!(second.actions, vec![SyncAction::MakeDirectory(PathBuf::from("x"))]);
        assert!(fx.replica.join("x").is_dir());
    }
}
