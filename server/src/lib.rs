//! Quotesync Server - hosts a quote collection and keeps it in sync with a
//! remote source.
//!
//! The server owns one [`Store`](quotesync_engine::Store), exposes it over
//! HTTP, and runs a [`Scheduler`] that periodically merges remote batches
//! into it using the quotesync-engine reconciliation logic.

pub mod config;
pub mod error;
pub mod handlers;
pub mod persistence;
pub mod remote;
pub mod routes;
pub mod scheduler;

use crate::config::Config;
use crate::remote::RemoteFetcher;
use crate::scheduler::{Scheduler, SchedulerConfig, SharedStore, SyncMeta};
use axum::Router;
use quotesync_engine::Store;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub fetcher: Arc<dyn RemoteFetcher>,
    pub scheduler: Scheduler,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire a store and a remote source into shared state.
    ///
    /// The last sync time is kept in memory only. Auto-sync is left
    /// disabled; call [`Scheduler::enable_auto_sync`] once a runtime is
    /// available.
    pub fn new(store: Store, fetcher: Arc<dyn RemoteFetcher>, config: Config) -> Self {
        Self::build(store, fetcher, None, config)
    }

    /// Like [`AppState::new`], restoring and recording the last sync time
    /// through `meta`.
    pub fn with_sync_meta(
        store: Store,
        fetcher: Arc<dyn RemoteFetcher>,
        meta: Arc<dyn SyncMeta>,
        config: Config,
    ) -> Self {
        Self::build(store, fetcher, Some(meta), config)
    }

    fn build(
        store: Store,
        fetcher: Arc<dyn RemoteFetcher>,
        meta: Option<Arc<dyn SyncMeta>>,
        config: Config,
    ) -> Self {
        let store: SharedStore = Arc::new(tokio::sync::Mutex::new(store));
        let scheduler_config = SchedulerConfig {
            interval: config.sync_interval,
            batch_limit: config.remote_limit,
        };
        let scheduler = match meta {
            Some(meta) => {
                Scheduler::with_meta(store.clone(), fetcher.clone(), meta, scheduler_config)
            }
            None => Scheduler::new(store.clone(), fetcher.clone(), scheduler_config),
        };

        Self {
            store,
            fetcher,
            scheduler,
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
