//! Export and import format for quote collections.
//!
//! The format is a JSON array of `{"text": ..., "category": ...}` objects,
//! pretty-printed, fields in that order. The same format is used for
//! persisted state, so an exported file can be imported by another instance
//! or dropped in as a store's saved collection.

use crate::{
    error::{Field, Result},
    Error, QuoteRecord,
};
use serde_json::Value;

/// Suggested file name for an export.
pub const EXPORT_FILE_NAME: &str = "quotes.json";

/// Media type of an export.
pub const EXPORT_CONTENT_TYPE: &str = "application/json";

/// Serialize quotes in the export format.
///
/// Fails with [`Error::Serialization`] if the encoder does.
pub fn export(quotes: &[QuoteRecord]) -> Result<String> {
    serde_json::to_string_pretty(quotes).map_err(|e| Error::Serialization(e.to_string()))
}

/// Parse an import payload into per-item results.
///
/// Fails with [`Error::MalformedImportPayload`] if the payload is not JSON or
/// not an array. Items that are not objects with non-empty string `text` and
/// `category` come back as [`Error::Validation`] so the caller can skip them.
pub fn parse_import(payload: &[u8]) -> Result<Vec<Result<QuoteRecord>>> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| Error::MalformedImportPayload(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items.iter().map(parse_item).collect()),
        other => Err(Error::MalformedImportPayload(format!(
            "expected an array of quotes, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decode a persisted collection, dropping unusable items.
///
/// Returns `None` when the payload is not a JSON array at all, which callers
/// treat the same as "nothing persisted".
pub fn decode_collection(payload: &[u8]) -> Option<Vec<QuoteRecord>> {
    let items = parse_import(payload).ok()?;
    Some(items.into_iter().filter_map(Result::ok).collect())
}

fn parse_item(item: &Value) -> Result<QuoteRecord> {
    let text = item
        .get("text")
        .and_then(Value::as_str)
        .ok_or(Error::Validation(Field::Text))?;
    let category = item
        .get("category")
        .and_then(Value::as_str)
        .ok_or(Error::Validation(Field::Category))?;
    QuoteRecord::new(text, category)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
