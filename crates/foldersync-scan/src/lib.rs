//! Tree enumeration and content fingerprinting for foldersync.
//!
//! Two pieces live here, both read-only with respect to the filesystem:
//!
//! - [`TreeWalker`] enumerates a directory tree in pre-order (directories
//!   before their contents) using jwalk, yielding root-relative entries.
//! - [`Fingerprinter`] streams a file through BLAKE3 in bounded chunks to
//!   produce a [`Fingerprint`] for content comparison.
//!
//! # Example
//!
//! ```rust,no_run
//! use foldersync_scan::{Fingerprinter, TreeWalker};
//!
//! let listing = TreeWalker::new().walk("/path/to/source".as_ref()).unwrap();
//! let fingerprinter = Fingerprinter::new();
//!
//! for entry in listing.files() {
//!     let fp = fingerprinter.fingerprint_file(&entry.resolve(listing.root())).unwrap();
//!     println!("{} {}", fp.short_hex(), entry.relative.display());
//! }
//! ```

mod fingerprint;
mod walker;

pub use fingerprint::{fingerprint_bytes, ContentHasher, Fingerprinter};
pub use walker::{TreeListing, TreeWalker};

// Re-export core types for convenience
pub use foldersync_core::{EntryFailure, EntryKind, FailureStage, Fingerprint, SyncError, TreeEntry};
