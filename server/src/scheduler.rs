//! Sync scheduler.
//!
//! Runs reconciliation attempts on manual request and, while auto-sync is
//! enabled, on a fixed interval. At most one attempt runs at a time: a
//! trigger that arrives while an attempt is in flight is dropped, not queued.
//!
//! Each attempt fetches the remote batch first, without touching the store,
//! and then merges it under the store lock in one synchronous pass. A failed
//! fetch leaves the store unchanged; the next tick simply tries again.
//!
//! The time of the last successful attempt can be kept across restarts
//! through a [`SyncMeta`] hook.

use crate::remote::RemoteFetcher;
use chrono::{DateTime, Utc};
use quotesync_engine::{Error, Reconciler, Store, SyncResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// The store shared between the scheduler and request handlers.
pub type SharedStore = Arc<tokio::sync::Mutex<Store>>;

/// Load/save hooks for sync metadata.
pub trait SyncMeta: Send + Sync {
    /// When the last successful attempt finished, if ever.
    fn load_last_sync(&self) -> Option<DateTime<Utc>>;

    /// Record a successful attempt.
    fn save_last_sync(&self, at: DateTime<Utc>) -> Result<(), Error>;
}

/// Whether an attempt is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
}

/// Result of a single trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The attempt ran to completion.
    Completed {
        attempt_id: Uuid,
        result: SyncResult,
        finished_at: DateTime<Utc>,
    },
    /// The attempt ran and failed. Nothing was merged unless the failure
    /// was a save error after the merge.
    Failed { attempt_id: Uuid, error: Error },
    /// Another attempt was already running.
    Skipped,
}

/// Scheduler settings.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Time between automatic attempts
    pub interval: Duration,
    /// Quotes requested per attempt
    pub batch_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            batch_limit: 10,
        }
    }
}

/// Handle to the scheduler. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    store: SharedStore,
    fetcher: Arc<dyn RemoteFetcher>,
    meta: Option<Arc<dyn SyncMeta>>,
    config: SchedulerConfig,
    running: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

/// Marks the scheduler as running until dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    /// Create a scheduler that keeps the last sync time in memory only.
    /// Auto-sync starts disabled.
    pub fn new(
        store: SharedStore,
        fetcher: Arc<dyn RemoteFetcher>,
        config: SchedulerConfig,
    ) -> Self {
        Self::build(store, fetcher, None, config)
    }

    /// Create a scheduler that restores and records the last sync time
    /// through `meta`.
    pub fn with_meta(
        store: SharedStore,
        fetcher: Arc<dyn RemoteFetcher>,
        meta: Arc<dyn SyncMeta>,
        config: SchedulerConfig,
    ) -> Self {
        Self::build(store, fetcher, Some(meta), config)
    }

    fn build(
        store: SharedStore,
        fetcher: Arc<dyn RemoteFetcher>,
        meta: Option<Arc<dyn SyncMeta>>,
        config: SchedulerConfig,
    ) -> Self {
        let last_sync = meta.as_ref().and_then(|meta| meta.load_last_sync());

        Self {
            inner: Arc::new(Inner {
                store,
                fetcher,
                meta,
                config,
                running: AtomicBool::new(false),
                timer: Mutex::new(None),
                last_sync: Mutex::new(last_sync),
            }),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.config
    }

    pub fn state(&self) -> SyncState {
        if self.inner.running.load(Ordering::Acquire) {
            SyncState::Running
        } else {
            SyncState::Idle
        }
    }

    /// When the last attempt completed successfully.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *lock(&self.inner.last_sync)
    }

    /// Run one attempt now, unless one is already running.
    pub async fn trigger(&self) -> SyncOutcome {
        let Some(_running) = RunningGuard::acquire(&self.inner.running) else {
            debug!("Sync already running, dropping trigger");
            return SyncOutcome::Skipped;
        };

        let attempt_id = Uuid::new_v4();
        self.attempt(attempt_id)
            .instrument(tracing::info_span!("sync", %attempt_id))
            .await
    }

    /// Run [`trigger`](Self::trigger) in its own task.
    ///
    /// The attempt runs to completion even if the returned handle is dropped.
    pub fn spawn_trigger(&self) -> JoinHandle<SyncOutcome> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.trigger().await })
    }

    async fn attempt(&self, attempt_id: Uuid) -> SyncOutcome {
        let batch = match self
            .inner
            .fetcher
            .fetch_batch(self.inner.config.batch_limit)
            .await
        {
            Ok(batch) => batch,
            Err(error) => {
                warn!(%error, "Sync failed, will retry on next tick");
                return SyncOutcome::Failed { attempt_id, error };
            }
        };

        let received = batch.len();
        let mut store = self.inner.store.lock().await;
        let report = Reconciler::new(&mut store).merge_detailed(batch);
        drop(store);

        match report {
            Ok(report) => {
                for conflict in &report.conflicts {
                    debug!(
                        index = conflict.index,
                        text = conflict.remote.text(),
                        local_category = conflict.local.category(),
                        remote_category = conflict.remote.category(),
                        "Remote category replaced local"
                    );
                }

                let finished_at = Utc::now();
                *lock(&self.inner.last_sync) = Some(finished_at);
                if let Some(meta) = &self.inner.meta {
                    if let Err(error) = meta.save_last_sync(finished_at) {
                        warn!(%error, "Could not record last sync time");
                    }
                }

                info!(
                    received,
                    added = report.result.added_count,
                    conflicts = report.result.conflict_count,
                    "Sync complete"
                );
                SyncOutcome::Completed {
                    attempt_id,
                    result: report.result,
                    finished_at,
                }
            }
            Err(error) => {
                warn!(%error, "Sync merged but could not be saved");
                SyncOutcome::Failed { attempt_id, error }
            }
        }
    }

    /// Start the interval timer. Does nothing if it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enable_auto_sync(&self) {
        let mut timer = lock(&self.inner.timer);
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let interval = self.inner.config.interval;
        let weak = Arc::downgrade(&self.inner);
        *timer = Some(tokio::spawn(run_timer(weak, interval)));
        info!(interval_secs = interval.as_secs(), "Auto-sync enabled");
    }

    /// Stop the interval timer. An attempt already in flight runs to
    /// completion.
    pub fn disable_auto_sync(&self) {
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
            info!("Auto-sync disabled");
        }
    }

    pub fn is_auto_sync_enabled(&self) -> bool {
        lock(&self.inner.timer)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Spawn an attempt on every tick until the scheduler is dropped or the task
/// is aborted. Attempts run in their own tasks so aborting the timer never
/// cancels one mid-flight.
async fn run_timer(inner: Weak<Inner>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip first immediate tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };
        Scheduler { inner }.spawn_trigger();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }
}
