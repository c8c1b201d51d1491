//! Quote handlers - list, add, pick and categorize local quotes.

use crate::error::{AppError, Result};
use crate::remote::RemoteFetcher;
use crate::scheduler::SharedStore;
use quotesync_engine::QuoteRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message returned when a category filter matches nothing.
pub const NO_QUOTES_MESSAGE: &str = "No quotes available for this category.";

/// Query parameters selecting a category.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Category to filter by; absent or `"all"` means every quote
    pub category: Option<String>,
}

/// Request body for adding a quote.
#[derive(Debug, Deserialize)]
pub struct AddQuoteRequest {
    pub text: String,
    pub category: String,
}

/// Response listing quotes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotesResponse {
    pub quotes: Vec<QuoteRecord>,
    pub count: usize,
}

/// Response listing categories.
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// List quotes, optionally filtered by category.
pub async fn handle_list(store: &SharedStore, query: CategoryQuery) -> QuotesResponse {
    let store = store.lock().await;
    let quotes: Vec<QuoteRecord> = store
        .list(query.category.as_deref())
        .into_iter()
        .cloned()
        .collect();

    QuotesResponse {
        count: quotes.len(),
        quotes,
    }
}

/// Add a quote locally, then publish it upstream in the background.
pub async fn handle_add(
    store: &SharedStore,
    fetcher: &Arc<dyn RemoteFetcher>,
    request: AddQuoteRequest,
) -> Result<QuoteRecord> {
    let quote = store.lock().await.add(&request.text, &request.category)?;
    tracing::info!(category = quote.category(), "Quote added locally");

    let fetcher = Arc::clone(fetcher);
    let published = quote.clone();
    tokio::spawn(async move {
        if let Err(e) = fetcher.publish(&published).await {
            tracing::debug!(error = %e, "Publishing quote upstream failed, ignoring");
        }
    });

    Ok(quote)
}

/// Pick a random quote within the category filter.
pub async fn handle_random(store: &SharedStore, query: CategoryQuery) -> Result<QuoteRecord> {
    let seed: usize = rand::random();
    let store = store.lock().await;

    store
        .pick(query.category.as_deref(), seed)
        .cloned()
        .ok_or_else(|| AppError::NotFound(NO_QUOTES_MESSAGE.to_string()))
}

/// List `"all"` plus every category present.
pub async fn handle_categories(store: &SharedStore) -> CategoriesResponse {
    CategoriesResponse {
        categories: store.lock().await.distinct_categories(),
    }
}
