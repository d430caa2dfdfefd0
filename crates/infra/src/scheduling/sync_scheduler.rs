//! Interval scheduler driving reconciliation passes.
//!
//! Each tick optionally resyncs calendar feeds, then runs one
//! [`Reconciler::sync_all`] pass. Cancellation is only observed between
//! ticks: a pass that has started always runs to completion.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use pbxpresence_common::SystemClock;
//! use pbxpresence_core::Reconciler;
//! use pbxpresence_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
//!
//! # async fn example(reconciler: Arc<Reconciler>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler = SyncScheduler::new(
//!     reconciler,
//!     Arc::new(SystemClock),
//!     SyncSchedulerConfig { interval: Duration::from_secs(300), ..Default::default() },
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pbxpresence_common::Clock;
use pbxpresence_core::{CalendarSyncService, Reconciler};
use pbxpresence_domain::constants::DEFAULT_SYNC_INTERVAL_MINUTES;
use pbxpresence_domain::{PresenceError, SyncConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for sync scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSchedulerConfig {
    /// Time between passes
    pub interval: Duration,
    /// Run one pass right after start instead of waiting a full interval
    pub run_immediately: bool,
    /// How long `stop` waits for an in-flight pass
    pub shutdown_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_MINUTES * 60),
            run_immediately: false,
            shutdown_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&SyncConfig> for SyncSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_minutes.max(1) * 60),
            ..Self::default()
        }
    }
}

/// Everything the background loop needs, moved into the spawned task.
#[derive(Clone)]
struct SyncLoopContext {
    reconciler: Arc<Reconciler>,
    calendar: Option<Arc<CalendarSyncService>>,
    clock: Arc<dyn Clock>,
    passes: Arc<AtomicU64>,
}

/// Sync scheduler for periodic reconciliation
pub struct SyncScheduler {
    context: SyncLoopContext,
    config: SyncSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    pub fn new(
        reconciler: Arc<Reconciler>,
        clock: Arc<dyn Clock>,
        config: SyncSchedulerConfig,
    ) -> Self {
        Self {
            context: SyncLoopContext {
                reconciler,
                calendar: None,
                clock,
                passes: Arc::new(AtomicU64::new(0)),
            },
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Resync calendar feeds before every pass.
    pub fn with_calendar_sync(mut self, calendar: Arc<CalendarSyncService>) -> Self {
        self.context.calendar = Some(calendar);
        self
    }

    pub fn config(&self) -> &SyncSchedulerConfig {
        &self.config
    }

    /// Number of ticks that ran to completion, failed passes included.
    pub fn completed_passes(&self) -> u64 {
        self.context.passes.load(Ordering::SeqCst)
    }

    /// Start the scheduler
    ///
    /// Spawns a background task that runs a pass every interval.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting sync scheduler");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let context = self.context.clone();
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sync_loop(context, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the loop and waits for an in-flight pass to finish.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running or the pass outlives the
    /// shutdown timeout
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping sync scheduler");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = self.config.shutdown_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|err| SchedulerError::TaskJoinFailed(err.to_string()))?;
        }

        info!("Sync scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle that
    /// hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Background sync loop
    async fn sync_loop(
        context: SyncLoopContext,
        config: SyncSchedulerConfig,
        cancel: CancellationToken,
    ) {
        if config.run_immediately && !cancel.is_cancelled() {
            Self::run_tick(&context).await;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Sync loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    // Not raced against cancellation: a started pass completes.
                    Self::run_tick(&context).await;
                }
            }
        }
    }

    async fn run_tick(context: &SyncLoopContext) {
        let started = Instant::now();

        if let Some(calendar) = &context.calendar {
            match calendar.sync_all(context.clock.now()).await {
                Ok(report) => debug!(
                    synced = report.synced,
                    failed = report.failed,
                    entries = report.entries,
                    "Calendar resync completed"
                ),
                Err(err) => warn!(error = %err, "Calendar resync failed"),
            }
        }

        match context.reconciler.sync_all(context.clock.now()).await {
            Ok(report) => info!(
                processed = report.processed,
                updated = report.updated,
                unchanged = report.unchanged,
                errors = report.errors,
                duration_ms = started.elapsed().as_millis() as u64,
                "Scheduled sync pass completed"
            ),
            Err(PresenceError::ConfigurationMissing(missing)) => {
                warn!(missing = %missing, "Scheduled sync skipped: PBX not configured");
            }
            Err(err) => error!(error = %err, "Scheduled sync pass failed"),
        }

        context.passes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            if self.is_running() {
                warn!("SyncScheduler dropped while running; cancelling");
            }
            self.cancellation_token.cancel();
        }
    }
}
