//! Synchronization configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default wait between the end of one cycle and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default read size used when fingerprinting files.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for a synchronization service.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SyncConfig {
    /// Root of the authoritative tree.
    pub source: PathBuf,

    /// Root of the tree kept in sync with the source.
    pub replica: PathBuf,

    /// Wait between cycle completions.
    #[builder(default = "DEFAULT_INTERVAL")]
    #[serde(default = "default_interval")]
    pub interval: Duration,

    /// Read chunk size for fingerprinting.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Treat files of different sizes as changed without hashing them.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub compare_sizes_first: bool,

    /// Stop the scheduler when the source root is missing instead of retrying.
    #[builder(default = "false")]
    #[serde(default)]
    pub exit_on_structural_error: bool,
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_true() -> bool {
    true
}

impl SyncConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let source = match self.source {
            Some(ref source) if !source.as_os_str().is_empty() => source,
            Some(_) => return Err("Source path cannot be empty".to_string()),
            None => return Err("Source path is required".to_string()),
        };
        let replica = match self.replica {
            Some(ref replica) if !replica.as_os_str().is_empty() => replica,
            Some(_) => return Err("Replica path cannot be empty".to_string()),
            None => return Err("Replica path is required".to_string()),
        };

        if source == replica {
            return Err("Source and replica must be different paths".to_string());
        }
        if nested(source, replica) {
            return Err(format!(
                "Source {} and replica {} must not be nested inside each other",
                source.display(),
                replica.display()
            ));
        }
        if self.interval.is_some_and(|i| i.is_zero()) {
            return Err("Interval must be greater than zero".to_string());
        }
        if self.chunk_size == Some(0) {
            return Err("Chunk size must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Lexical check: one path is a component-wise prefix of the other.
fn nested(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

impl SyncConfig {
    /// Create a new config builder.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Create a config with default tuning for a source/replica pair.
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            interval: DEFAULT_INTERVAL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            compare_sizes_first: true,
            exit_on_structural_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SyncConfig::builder()
            .source("/data/source")
            .replica("/backup/replica")
            .interval(Duration::from_secs(5))
            .compare_sizes_first(false)
            .build()
            .unwrap();

        assert_eq!(config.source, PathBuf::from("/data/source"));
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!config.compare_sizes_first);
        assert!(!config.exit_on_structural_error);
    }

    #[test]
    fn test_config_simple() {
        let config = SyncConfig::new("/a", "/b");
        assert_eq!(config.interval, DEFAULT_INTERVAL);
        assert!(config.compare_sizes_first);
    }

    #[test]
    fn test_rejects_missing_and_equal_paths() {
        assert!(SyncConfig::builder().replica("/b").build().is_err());
        assert!(SyncConfig::builder().source("").replica("/b").build().is_err());
        assert!(SyncConfig::builder().source("/a").replica("/a").build().is_err());
    }

    #[test]
    fn test_rejects_nested_roots() {
        let err = SyncConfig::builder()
            .source("/data")
            .replica("/data/replica")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("nested"));

        assert!(SyncConfig::builder().source("/data/src").replica("/data").build().is_err());
        // Sibling with a common name prefix is fine.
        assert!(SyncConfig::builder().source("/data").replica("/data-replica").build().is_ok());
    }

    #[test]
    fn test_rejects_zero_values() {
        assert!(SyncConfig::builder()
            .source("/a")
            .replica("/b")
            .interval(Duration::ZERO)
            .build()
            .is_err());
        assert!(SyncConfig::builder()
            .source("/a")
            .replica("/b")
            .chunk_size(0usize)
            .build()
            .is_err());
    }
}
