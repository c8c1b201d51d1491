//! Sync endpoint routes.

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};

use crate::error::Result;
use crate::handlers::{
    handle_auto_sync, handle_status, handle_sync, AutoSyncRequest, SyncResponse, SyncStatus,
};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_handler))
        .route("/sync/status", get(status_handler))
        .route("/sync/auto", put(auto_sync_handler))
}

/// POST /sync - Sync with the remote source now.
async fn sync_handler(State(state): State<AppState>) -> Result<Json<SyncResponse>> {
    let response = handle_sync(&state.scheduler).await?;
    Ok(Json(response))
}

/// GET /sync/status - Report scheduler state.
async fn status_handler(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(handle_status(&state.scheduler))
}

/// PUT /sync/auto - Enable or disable automatic sync.
async fn auto_sync_handler(
    State(state): State<AppState>,
    Json(request): Json<AutoSyncRequest>,
) -> Json<SyncStatus> {
    Json(handle_auto_sync(&state.scheduler, request))
}
