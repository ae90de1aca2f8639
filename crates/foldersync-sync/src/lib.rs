//! Synchronization engine for foldersync.
//!
//! This crate makes a replica tree match a source tree and keeps it that
//! way on a fixed schedule.
//!
//! - [`Synchronizer`] runs one cycle: it first propagates directories and
//!   new or changed files from the source, then prunes replica files the
//!   source no longer has. Per-entry failures are logged and collected in
//!   the [`SyncReport`]; they never abort the cycle.
//! - [`Scheduler`] runs a cycle immediately, then again after every
//!   interval, until its [`CancellationToken`] fires.
//! - [`SyncLogger`] is the logging capability both of them receive at
//!   construction.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use foldersync_sync::{Scheduler, SyncConfig, TracingLogger};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let config = SyncConfig::new("/data/source", "/backup/replica");
//! let scheduler = Scheduler::new(&config, Arc::new(TracingLogger));
//! let cancel = CancellationToken::new();
//! let summary = scheduler.run(cancel).await.unwrap();
//! println!("ran {} cycles", summary.cycles);
//! # }
//! ```

mod logger;
mod ops;
mod scheduler;
mod synchronizer;

pub use logger::{LogLevel, LogRecord, MemoryLogger, SyncLogger, TracingLogger};
pub use ops::{copy_file, ensure_directory, remove_file, remove_symlink};
pub use scheduler::{Scheduler, SchedulerEvent, SchedulerState, SchedulerSummary, EVENT_CHANNEL_SIZE};
pub use synchronizer::Synchronizer;

pub use foldersync_scan::{ContentHasher, Fingerprinter};
pub use tokio_util::sync::CancellationToken;

// Re-export core types
pub use foldersync_core::{
    ActionKind, EntryFailure, FailureStage, Fingerprint, SyncAction, SyncConfig, SyncError, SyncReport,
};
