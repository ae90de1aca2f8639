//! Periodic cycle scheduling with prompt cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use foldersync_core::{SyncConfig, SyncError, SyncReport};

use crate::logger::SyncLogger;
use crate::synchronizer::Synchronizer;

/// Channel buffer size for scheduler state events.
pub const EVENT_CHANNEL_SIZE: usize = 100;

/// Where the scheduler is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, no cycle started yet.
    Idle,
    /// A cycle is running.
    Scanning,
    /// Waiting for the interval to elapse.
    Sleeping,
    /// Cancelled or escalated. Terminal.
    Stopped,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Sleeping => write!(f, "sleeping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// State transition broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerEvent {
    /// State just entered.
    pub state: SchedulerState,
    /// Number of the current (or last) cycle, starting at 1.
    pub cycle: u64,
}

/// Totals over the lifetime of a [`Scheduler::run`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    /// Cycles started.
    pub cycles: u64,
    /// Cycles that ended with a structural or unexpected error.
    pub failed_cycles: u64,
    /// Entry failures across all completed cycles.
    pub entry_failures: u64,
}

/// Runs a [`Synchronizer`] immediately and then once per interval.
pub struct Scheduler {
    synchronizer: Arc<Synchronizer>,
    interval: Duration,
    exit_on_structural_error: bool,
    logger: Arc<dyn SyncLogger>,
    events_tx: broadcast::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create a scheduler for `config`, logging through `logger`.
    pub fn new(config: &SyncConfig, logger: Arc<dyn SyncLogger>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            synchronizer: Arc::new(Synchronizer::new(config, Arc::clone(&logger))),
            interval: config.interval,
            exit_on_structural_error: config.exit_on_structural_error,
            logger,
            events_tx,
        }
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events_tx.subscribe()
    }

    /// Run cycles until `cancel` fires.
    ///
    /// A cycle is never started once cancellation has been requested, and
    /// the wait between cycles ends as soon as it is. Structural errors are
    /// logged and retried on the next interval; with
    /// `exit_on_structural_error` set, a misconfigured source root ends the
    /// loop with `Err` instead.
    pub async fn run(&self, cancel: CancellationToken) -> Result<SchedulerSummary, SyncError> {
        let mut summary = SchedulerSummary::default();
        let mut cycle = 0;

        self.publish(SchedulerState::Idle, cycle);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            cycle += 1;
            summary.cycles = cycle;
            self.publish(SchedulerState::Scanning, cycle);

            match self.run_cycle(&cancel).await {
                Ok(report) => {
                    summary.entry_failures += report.failure_count() as u64;
                    self.log_report(cycle, &report);
                    if !report.cancelled {
                        self.logger
                            .info("Synchronization cycle complete. Waiting for next interval...");
                    }
                }
                Err(CycleError::Sync(err)) => {
                    summary.failed_cycles += 1;
                    self.logger
                        .error(&format!("Synchronization cycle {cycle} aborted: {err}"));
                    if self.exit_on_structural_error && err.is_misconfiguration() {
                        self.publish(SchedulerState::Stopped, cycle);
                        return Err(err);
                    }
                }
                Err(CycleError::Unexpected(message)) => {
                    summary.failed_cycles += 1;
                    self.logger
                        .error(&format!("An unexpected error occurred in cycle {cycle}: {message}"));
                }
            }

            if cancel.is_cancelled() {
                break;
            }

            self.publish(SchedulerState::Sleeping, cycle);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.publish(SchedulerState::Stopped, cycle);
        self.logger
            .info("Synchronization service interrupted, shutting down.");

        Ok(summary)
    }

    /// Run one cycle on the blocking pool.
    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<SyncReport, CycleError> {
        let synchronizer = Arc::clone(&self.synchronizer);
        let cancel = cancel.clone();

        match tokio::task::spawn_blocking(move || synchronizer.synchronize(&cancel)).await {
            Ok(result) => result.map_err(CycleError::Sync),
            Err(join_error) => Err(CycleError::Unexpected(join_error.to_string())),
        }
    }

    fn log_report(&self, cycle: u64, report: &SyncReport) {
        self.logger.info(&format!(
            "Cycle {cycle}: {} ({} copied in {:.2}s)",
            report.summary(),
            humansize::format_size(report.bytes_copied, humansize::BINARY),
            report.duration.as_secs_f64()
        ));
    }

    fn publish(&self, state: SchedulerState, cycle: u64) {
        // No subscribers is fine.
        let _ = self.events_tx.send(SchedulerEvent { state, cycle });
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("synchronizer", &self.synchronizer)
            .field("interval", &self.interval)
            .field("exit_on_structural_error", &self.exit_on_structural_error)
            .finish_non_exhaustive()
    }
}

/// Why a cycle produced no report.
enum CycleError {
    Sync(SyncError),
    Unexpected(String),
}
