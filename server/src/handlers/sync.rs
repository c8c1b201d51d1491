//! Sync handlers - manual trigger, status and auto-sync toggle.

use crate::error::{AppError, Result};
use crate::scheduler::{Scheduler, SyncOutcome, SyncState};
use chrono::{DateTime, Utc};
use quotesync_engine::SyncResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for a manual sync.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SyncResponse {
    #[serde(rename_all = "camelCase")]
    Completed {
        attempt_id: Uuid,
        added_count: usize,
        conflict_count: usize,
        message: String,
        last_sync: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Skipped { message: String },
}

/// Current scheduler state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub auto_sync: bool,
    pub running: bool,
    pub interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

/// Request body for toggling auto-sync.
#[derive(Debug, Deserialize)]
pub struct AutoSyncRequest {
    pub enabled: bool,
}

/// Human-readable summary of a completed sync.
pub fn describe(result: &SyncResult) -> String {
    if !result.has_changes() {
        return "Sync complete: no changes.".to_string();
    }

    format!(
        "Sync complete: +{} new, {} conflict{} resolved (server wins).",
        result.added_count,
        result.conflict_count,
        if result.conflict_count == 1 { "" } else { "s" }
    )
}

/// Run a sync now.
///
/// The attempt runs in its own task, so a client disconnecting mid-request
/// does not cancel it.
pub async fn handle_sync(scheduler: &Scheduler) -> Result<SyncResponse> {
    let outcome = scheduler
        .spawn_trigger()
        .await
        .map_err(|e| AppError::Internal(format!("sync task failed: {}", e)))?;

    match outcome {
        SyncOutcome::Completed {
            attempt_id,
            result,
            finished_at,
        } => Ok(SyncResponse::Completed {
            attempt_id,
            added_count: result.added_count,
            conflict_count: result.conflict_count,
            message: describe(&result),
            last_sync: finished_at,
        }),
        SyncOutcome::Skipped => Ok(SyncResponse::Skipped {
            message: "Sync already in progress.".to_string(),
        }),
        SyncOutcome::Failed { error, .. } => Err(AppError::Engine(error)),
    }
}

/// Report the scheduler state.
pub fn handle_status(scheduler: &Scheduler) -> SyncStatus {
    SyncStatus {
        auto_sync: scheduler.is_auto_sync_enabled(),
        running: scheduler.state() == SyncState::Running,
        interval_secs: scheduler.config().interval.as_secs(),
        last_sync: scheduler.last_sync(),
    }
}

/// Enable or disable the interval timer.
pub fn handle_auto_sync(scheduler: &Scheduler, request: AutoSyncRequest) -> SyncStatus {
    if request.enabled {
        scheduler.enable_auto_sync();
    } else {
        scheduler.disable_auto_sync();
    }
    handle_status(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteFetcher;
    use crate::scheduler::{SchedulerConfig, SharedStore};
    use futures::future::{BoxFuture, FutureExt};
    use quotesync_engine::{Error, MemoryPersistence, QuoteRecord, Store};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Returns one quote once the gate opens.
    struct GatedFetcher {
        gate: Arc<Semaphore>,
    }

    impl RemoteFetcher for GatedFetcher {
        fn fetch_batch(
            &self,
            _limit: usize,
        ) -> BoxFuture<'_, std::result::Result<Vec<QuoteRecord>, Error>> {
            async move {
                let permit = self.gate.acquire().await;
                drop(permit);
                Ok(vec![QuoteRecord::new("Be bold", "Courage").unwrap()])
            }
            .boxed()
        }
    }

    #[test]
    fn describe_results() {
        assert_eq!(describe(&SyncResult::default()), "Sync complete: no changes.");
        assert_eq!(
            describe(&SyncResult {
                added_count: 2,
                conflict_count: 1
            }),
            "Sync complete: +2 new, 1 conflict resolved (server wins)."
        );
        assert_eq!(
            describe(&SyncResult {
                added_count: 0,
                conflict_count: 3
            }),
            "Sync complete: +0 new, 3 conflicts resolved (server wins)."
        );
    }

    #[test]
    fn skipped_response_shape() {
        let json = serde_json::to_value(SyncResponse::Skipped {
            message: "busy".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "skipped", "message": "busy"}));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_request_does_not_cancel_sync() {
        let gate = Arc::new(Semaphore::new(0));
        let store: SharedStore = Arc::new(tokio::sync::Mutex::new(Store::new(
            MemoryPersistence::new(),
        )));
        let scheduler = Scheduler::new(
            store.clone(),
            Arc::new(GatedFetcher { gate: gate.clone() }),
            SchedulerConfig::default(),
        );

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), handle_sync(&scheduler)).await;
        assert!(abandoned.is_err());
        assert_eq!(scheduler.state(), SyncState::Running);

        gate.add_permits(1);
        while scheduler.state() == SyncState::Running {
            tokio::task::yield_now().await;
        }

        assert_eq!(store.lock().await.len(), 1);
        assert!(scheduler.last_sync().is_some());
    }
}
