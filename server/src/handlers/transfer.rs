//! Import and export handlers.

use crate::error::Result;
use crate::scheduler::SharedStore;
use quotesync_engine::ImportSummary;

/// Serialize the whole collection in the export format.
pub async fn handle_export(store: &SharedStore) -> Result<String> {
    let json = store.lock().await.export_json()?;
    Ok(json)
}

/// Merge an exported payload into the collection.
///
/// A payload that is not a JSON array is rejected before anything changes;
/// invalid items are skipped and counted.
pub async fn handle_import(store: &SharedStore, payload: &[u8]) -> Result<ImportSummary> {
    let summary = store.lock().await.import_json(payload)?;

    tracing::info!(
        added = summary.added,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        "Quotes imported"
    );
    Ok(summary)
}
