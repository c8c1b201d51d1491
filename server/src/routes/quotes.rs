//! Quote, category and import/export routes.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use quotesync_engine::{
    snapshot::{EXPORT_CONTENT_TYPE, EXPORT_FILE_NAME},
    ImportSummary, QuoteRecord,
};

use crate::error::Result;
use crate::handlers::{
    handle_add, handle_categories, handle_export, handle_import, handle_list, handle_random,
    AddQuoteRequest, CategoriesResponse, CategoryQuery, QuotesResponse,
};
use crate::AppState;

/// Create quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_handler).post(add_handler))
        .route("/quotes/random", get(random_handler))
        .route("/categories", get(categories_handler))
        .route("/export", get(export_handler))
        .route("/import", post(import_handler))
}

/// GET /quotes - List quotes, optionally by category.
async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Json<QuotesResponse> {
    Json(handle_list(&state.store, query).await)
}

/// POST /quotes - Add a quote.
async fn add_handler(
    State(state): State<AppState>,
    Json(request): Json<AddQuoteRequest>,
) -> Result<(StatusCode, Json<QuoteRecord>)> {
    let quote = handle_add(&state.store, &state.fetcher, request).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// GET /quotes/random - Pick a random quote.
async fn random_handler(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<QuoteRecord>> {
    let quote = handle_random(&state.store, query).await?;
    Ok(Json(quote))
}

/// GET /categories - List categories.
async fn categories_handler(State(state): State<AppState>) -> Json<CategoriesResponse> {
    Json(handle_categories(&state.store).await)
}

/// GET /export - Download the collection.
async fn export_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let json = handle_export(&state.store).await?;
    let headers = [
        (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
        ),
    ];
    Ok((headers, json))
}

/// POST /import - Merge an exported collection.
async fn import_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportSummary>> {
    let summary = handle_import(&state.store, &body).await?;
    Ok(Json(summary))
}
