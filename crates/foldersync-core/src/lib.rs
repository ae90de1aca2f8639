//! Core types for foldersync.
//!
//! This crate provides the data model shared by the scanner, the comparator
//! and the scheduler: tree entries, sync actions, content fingerprints,
//! per-cycle reports, errors and configuration.

mod action;
mod config;
mod entry;
mod error;
mod report;

pub use action::{ActionKind, SyncAction};
pub use config::{SyncConfig, SyncConfigBuilder, DEFAULT_CHUNK_SIZE, DEFAULT_INTERVAL};
pub use entry::{EntryKind, Fingerprint, TreeEntry};
pub use error::{EntryFailure, FailureStage, SyncError};
pub use report::SyncReport;
