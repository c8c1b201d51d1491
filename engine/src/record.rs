//! Quote records and the keys used to compare them.
//!
//! A quote *is* its wording: two records with the same [`text_key`] are the
//! same quote, and the category is an attribute the remote side may override.
//! Two records with the same [`exact_key`] are identical.

use crate::error::{Error, Field, Result};
use serde::{Deserialize, Serialize};

/// A single quote.
///
/// Both fields are trimmed and non-empty. Records are never edited field by
/// field; a conflicting record is replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawQuote")]
pub struct QuoteRecord {
    text: String,
    category: String,
}

/// Unvalidated wire shape of a quote.
#[derive(Deserialize)]
struct RawQuote {
    text: String,
    category: String,
}

impl TryFrom<RawQuote> for QuoteRecord {
    type Error = Error;

    fn try_from(raw: RawQuote) -> Result<Self> {
        QuoteRecord::new(raw.text, raw.category)
    }
}

impl QuoteRecord {
    /// Create a record, trimming both fields.
    ///
    /// Fails with [`Error::Validation`] if either field is empty after trimming.
    pub fn new(text: impl AsRef<str>, category: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        let category = category.as_ref().trim();

        if text.is_empty() {
            return Err(Error::Validation(Field::Text));
        }
        if category.is_empty() {
            return Err(Error::Validation(Field::Category));
        }

        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Identity key: the normalized wording.
    pub fn text_key(&self) -> String {
        text_key(&self.text)
    }

    /// Exact-duplicate key: normalized wording and category.
    pub fn exact_key(&self) -> String {
        exact_key(&self.text, &self.category)
    }
}

/// Normalize quote text for identity matching.
///
/// Total over any input, including the empty string.
pub fn text_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Normalize text and category for exact-duplicate matching.
pub fn exact_key(text: &str, category: &str) -> String {
    format!("{}|{}", text_key(text), category.trim().to_lowercase())
}
