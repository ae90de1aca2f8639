//! Streaming content fingerprints.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use blake3::Hasher;

use foldersync_core::{Fingerprint, DEFAULT_CHUNK_SIZE};

/// Computes BLAKE3 fingerprints of file content.
///
/// Files are read through a fixed-size buffer, so memory use does not grow
/// with file size. The digest depends only on the bytes read, never on the
/// chunk size.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    chunk_size: usize,
}

impl Fingerprinter {
    /// Create a fingerprinter with the default chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a fingerprinter reading `chunk_size` bytes at a time.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fingerprint the full content of a file.
    pub fn fingerprint_file(&self, path: &Path) -> io::Result<Fingerprint> {
        let file = File::open(path)?;
        self.fingerprint_reader(file)
    }

    /// Fold everything `reader` yields into a fingerprint.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> io::Result<Fingerprint> {
        let mut hasher = Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Fingerprint::new(*hasher.finalize().as_bytes()))
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces content fingerprints for files on disk.
///
/// The synchronizer compares files through this trait; [`Fingerprinter`] is
/// the implementation it uses unless told otherwise.
pub trait ContentHasher: Send + Sync {
    /// Fingerprint the full content of the file at `path`.
    fn hash_file(&self, path: &Path) -> io::Result<Fingerprint>;
}

impl ContentHasher for Fingerprinter {
    fn hash_file(&self, path: &Path) -> io::Result<Fingerprint> {
        self.fingerprint_file(path)
    }
}

/// Fingerprint an in-memory buffer.
pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
    Fingerprint::new(*blake3::hash(data).as_bytes())
}
