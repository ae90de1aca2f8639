//! Per-cycle synchronization report.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, SyncAction};
use crate::error::EntryFailure;

/// Outcome of one synchronization cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// When the cycle started.
    pub started_at: DateTime<Local>,
    /// Wall time spent in the cycle.
    pub duration: Duration,
    /// Actions applied, in the order they were applied.
    pub actions: Vec<SyncAction>,
    /// Entries that could not be processed.
    pub failures: Vec<EntryFailure>,
    /// Bytes written to the replica by create/update actions.
    pub bytes_copied: u64,
    /// Cycle stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self {
            started_at: Local::now(),
            duration: Duration::ZERO,
            actions: Vec::new(),
            failures: Vec::new(),
            bytes_copied: 0,
            cancelled: false,
        }
    }
}

impl SyncReport {
    /// Create an empty report stamped with the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an applied action.
    pub fn record_action(&mut self, action: SyncAction) {
        self.actions.push(action);
    }

    /// Record bytes copied by a create/update.
    pub fn record_copy(&mut self, action: SyncAction, bytes: u64) {
        self.bytes_copied += bytes;
        self.actions.push(action);
    }

    /// Record an entry failure.
    pub fn record_failure(&mut self, failure: EntryFailure) {
        self.failures.push(failure);
    }

    /// Number of actions applied.
    pub fn actions_applied(&self) -> usize {
        self.actions.len()
    }

    /// Number of entry failures.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Number of applied actions of the given kind.
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }

    /// True when the cycle ran to completion without entry failures.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Get a human-readable one-line summary.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} dirs created, {} files created, {} updated, {} removed",
            self.count(ActionKind::MakeDirectory),
            self.count(ActionKind::CreateFile),
            self.count(ActionKind::UpdateFile),
            self.count(ActionKind::DeleteFile),
        );
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        if self.cancelled {
            summary.push_str(" (interrupted)");
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureStage;
    use std::path::PathBuf;

    #[test]
    fn test_report_counts() {
        let mut report = SyncReport::new();
        report.record_action(SyncAction::MakeDirectory(PathBuf::from("dir1")));
        report.record_copy(SyncAction::CreateFile(PathBuf::from("dir1/a")), 10);
        report.record_copy(SyncAction::UpdateFile(PathBuf::from("b")), 5);
        report.record_action(SyncAction::DeleteFile(PathBuf::from("c")));

        assert_eq!(report.actions_applied(), 4);
        assert_eq!(report.count(ActionKind::CreateFile), 1);
        assert_eq!(report.bytes_copied, 15);
        assert!(report.is_clean());
        assert_eq!(
            report.summary(),
            "1 dirs created, 1 files created, 1 updated, 1 removed"
        );
    }

    #[test]
    fn test_report_with_failures() {
        let mut report = SyncReport::new();
        report.record_failure(EntryFailure::new("b.txt", FailureStage::Copy, "boom"));
        report.cancelled = true;

        assert_eq!(report.failure_count(), 1);
        assert!(!report.is_clean());
        assert!(report.summary().ends_with("1 failed (interrupted)"));
    }
}
