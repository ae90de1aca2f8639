//! Logging capability handed to the synchronizer and scheduler.

use std::sync::Mutex;

/// Sink for notable synchronization events.
///
/// One instance is built at startup and shared by everything that logs.
pub trait SyncLogger: Send + Sync {
    /// Record a notable event (directory created, file copied or removed).
    fn info(&self, message: &str);

    /// Record a failure.
    fn error(&self, message: &str);

    /// Record diagnostic detail. Ignored unless the sink cares.
    fn debug(&self, _message: &str) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl SyncLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "foldersync", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "foldersync", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "foldersync", "{}", message);
    }
}

/// Severity of a recorded line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

/// A line captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Keeps every line in memory. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded lines.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether any line at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    /// Drop all recorded lines.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.lock().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SyncLogger for MemoryLogger {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }
}
