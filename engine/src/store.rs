//! Store - the in-memory quote collection.
//!
//! The Store owns the authoritative, ordered list of quotes. Persistence is an
//! injected collaborator: the store calls [`Persistence::save`] after every
//! mutation and [`Persistence::load`] once when opened.

use crate::{
    error::Result, record::exact_key, reconcile::Reconciler, snapshot, Error, QuoteRecord,
    SyncResult,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Pseudo-category that matches every quote.
pub const ALL_CATEGORIES: &str = "all";

/// Load/save hooks for the collection.
pub trait Persistence: Send {
    /// Load the persisted collection, or `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<Vec<QuoteRecord>>>;

    /// Replace the persisted collection.
    fn save(&self, quotes: &[QuoteRecord]) -> Result<()>;
}

/// Persistence that keeps the last saved collection in memory.
///
/// Clones share state, so a test can hold one handle and give another to a
/// [`Store`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    saved: Option<Vec<QuoteRecord>>,
    save_count: usize,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already persisted collection.
    pub fn with_saved(quotes: Vec<QuoteRecord>) -> Self {
        let persistence = Self::default();
        persistence.state().saved = Some(quotes);
        persistence
    }

    /// Last saved collection.
    pub fn saved(&self) -> Option<Vec<QuoteRecord>> {
        self.state().saved.clone()
    }

    /// Number of times `save` was called.
    pub fn save_count(&self) -> usize {
        self.state().save_count
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Vec<QuoteRecord>>> {
        Ok(self.state().saved.clone())
    }

    fn save(&self, quotes: &[QuoteRecord]) -> Result<()> {
        let mut state = self.state();
        state.saved = Some(quotes.to_vec());
        state.save_count += 1;
        Ok(())
    }
}

/// Quotes used when nothing has been persisted yet.
pub fn default_quotes() -> Vec<QuoteRecord> {
    [
        (
            "The best way to predict the future is to invent it.",
            "Inspiration",
        ),
        (
            "Do not wait to strike till the iron is hot; but make it hot by striking.",
            "Motivation",
        ),
        (
            "Life is what happens when you’re busy making other plans.",
            "Life",
        ),
    ]
    .into_iter()
    .filter_map(|(text, category)| QuoteRecord::new(text, category).ok())
    .collect()
}

/// An ordered sequence of quotes with lookup indexes.
///
/// Duplicates by exact key are tolerated here; they are filtered only at
/// import and merge time.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    quotes: Vec<QuoteRecord>,
    /// First position of each text key, in insertion order.
    first_by_text: HashMap<String, usize>,
    /// How many records carry each exact key.
    exact_counts: HashMap<String, usize>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from quotes, keeping their order.
    pub fn from_quotes(quotes: Vec<QuoteRecord>) -> Self {
        let mut collection = Self {
            quotes,
            ..Self::default()
        };
        collection.rebuild_index();
        collection
    }

    pub fn get(&self, index: usize) -> Option<&QuoteRecord> {
        self.quotes.get(index)
    }

    pub fn as_slice(&self) -> &[QuoteRecord] {
        &self.quotes
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuoteRecord> {
        self.quotes.iter()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Position of the first quote with the given text key.
    pub fn position_by_text_key(&self, text_key: &str) -> Option<usize> {
        self.first_by_text.get(text_key).copied()
    }

    /// Whether any quote carries the given exact key.
    pub fn contains_exact_key(&self, exact_key: &str) -> bool {
        self.exact_counts.contains_key(exact_key)
    }

    fn push(&mut self, quote: QuoteRecord) {
        let index = self.quotes.len();
        self.first_by_text.entry(quote.text_key()).or_insert(index);
        *self.exact_counts.entry(quote.exact_key()).or_insert(0) += 1;
        self.quotes.push(quote);
    }

    fn replace_at(&mut self, index: usize, quote: QuoteRecord) -> Result<QuoteRecord> {
        let len = self.quotes.len();
        let slot = self
            .quotes
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;

        let previous = std::mem::replace(slot, quote);
        if previous.text_key() != self.quotes[index].text_key() {
            self.rebuild_index();
            return Ok(previous);
        }

        let old_key = previous.exact_key();
        if let Some(count) = self.exact_counts.get_mut(&old_key) {
            *count -= 1;
            if *count == 0 {
                self.exact_counts.remove(&old_key);
            }
        }
        *self
            .exact_counts
            .entry(self.quotes[index].exact_key())
            .or_insert(0) += 1;

        Ok(previous)
    }

    fn rebuild_index(&mut self) {
        self.first_by_text.clear();
        self.exact_counts.clear();
        for (index, quote) in self.quotes.iter().enumerate() {
            self.first_by_text.entry(quote.text_key()).or_insert(index);
            *self.exact_counts.entry(quote.exact_key()).or_insert(0) += 1;
        }
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Records appended to the collection
    pub added: usize,
    /// Records skipped because an identical quote already existed
    pub duplicates: usize,
    /// Records that failed validation
    pub rejected: usize,
}

/// The local quote store.
pub struct Store {
    collection: Collection,
    persistence: Box<dyn Persistence>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Create an empty store. Nothing is loaded or saved.
    pub fn new(persistence: impl Persistence + 'static) -> Self {
        Self::with_quotes(Vec::new(), persistence)
    }

    /// Create a store holding the given quotes.
    pub fn with_quotes(quotes: Vec<QuoteRecord>, persistence: impl Persistence + 'static) -> Self {
        Self {
            collection: Collection::from_quotes(quotes),
            persistence: Box::new(persistence),
        }
    }

    /// Load the persisted collection, falling back to [`default_quotes`].
    pub fn open(persistence: impl Persistence + 'static) -> Result<Self> {
        let quotes = persistence.load()?.unwrap_or_else(default_quotes);
        Ok(Self::with_quotes(quotes, persistence))
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Validate and append a quote, then persist.
    ///
    /// On a persistence failure the quote stays in memory and the error is
    /// returned.
    pub fn add(&mut self, text: &str, category: &str) -> Result<QuoteRecord> {
        let quote = QuoteRecord::new(text, category)?;
        self.collection.push(quote.clone());
        self.persist()?;
        Ok(quote)
    }

    /// Quotes in insertion order, optionally restricted to one category.
    ///
    /// A filter of `None`, `""` or [`ALL_CATEGORIES`] returns everything.
    pub fn list(&self, category: Option<&str>) -> Vec<&QuoteRecord> {
        match category {
            None | Some("") | Some(ALL_CATEGORIES) => self.collection.iter().collect(),
            Some(category) => self
                .collection
                .iter()
                .filter(|q| q.category() == category)
                .collect(),
        }
    }

    /// `"all"` followed by every category present, in first-seen order.
    pub fn distinct_categories(&self) -> Vec<String> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for quote in self.collection.iter() {
            if !categories.iter().any(|c| c == quote.category()) {
                categories.push(quote.category().to_string());
            }
        }
        categories
    }

    /// Pick the quote at `seed % len` among those matching the filter.
    ///
    /// The caller supplies the randomness.
    pub fn pick(&self, category: Option<&str>, seed: usize) -> Option<&QuoteRecord> {
        let pool = self.list(category);
        if pool.is_empty() {
            return None;
        }
        Some(pool[seed % pool.len()])
    }

    /// Merge already validated items, skipping exact duplicates, then persist
    /// once if anything was added.
    ///
    /// Items failing validation are counted and skipped. Any other error
    /// aborts the import before the collection is touched.
    pub fn import(
        &mut self,
        items: impl IntoIterator<Item = Result<QuoteRecord>>,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut staged = Vec::new();
        let mut staged_keys = HashSet::new();

        for item in items {
            match item {
                Ok(quote) => {
                    let key = quote.exact_key();
                    if self.collection.contains_exact_key(&key) || staged_keys.contains(&key) {
                        summary.duplicates += 1;
                    } else {
                        staged_keys.insert(key);
                        staged.push(quote);
                    }
                }
                Err(e) if e.is_per_record() => summary.rejected += 1,
                Err(e) => return Err(e),
            }
        }

        summary.added = staged.len();
        for quote in staged {
            self.collection.push(quote);
        }

        if summary.added > 0 {
            self.persist()?;
        }
        Ok(summary)
    }

    /// Parse an exported payload and import it.
    ///
    /// A payload that is not a JSON array aborts before anything changes.
    pub fn import_json(&mut self, payload: &[u8]) -> Result<ImportSummary> {
        let items = snapshot::parse_import(payload)?;
        self.import(items)
    }

    /// Serialize the whole collection in the export format.
    pub fn export_json(&self) -> Result<String> {
        snapshot::export(self.collection.as_slice())
    }

    /// Merge a remote batch under the server-wins policy.
    pub fn reconcile(&mut self, batch: Vec<QuoteRecord>) -> Result<SyncResult> {
        Reconciler::new(self).merge(batch)
    }

    /// Whether any quote has this text and category, compared by exact key.
    pub fn contains(&self, text: &str, category: &str) -> bool {
        self.collection.contains_exact_key(&exact_key(text, category))
    }

    pub(crate) fn push(&mut self, quote: QuoteRecord) {
        self.collection.push(quote);
    }

    /// Overwrite the quote at `index`, keeping its position.
    pub(crate) fn replace_at(&mut self, index: usize, quote: QuoteRecord) -> Result<QuoteRecord> {
        self.collection.replace_at(index, quote)
    }

    pub(crate) fn persist(&self) -> Result<()> {
        self.persistence.save(self.collection.as_slice())
    }
}
