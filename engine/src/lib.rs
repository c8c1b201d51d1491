//! # Quotesync Engine
//!
//! A deterministic store and reconciliation engine for a local quote
//! collection that is periodically merged with a remote source.
//!
//! ## Design Principles
//!
//! - **No IO**: persistence and the remote source are collaborators the caller
//!   injects or drives
//! - **Deterministic**: the same collection and batch always merge the same way
//! - **Testable**: pure logic, an in-memory persistence is included
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`QuoteRecord`] is a trimmed, non-empty `text` and `category`. Text is the
//! natural key ([`record::text_key`]); text plus category is the exact key
//! ([`record::exact_key`]).
//!
//! ### Store
//!
//! The [`Store`] owns the ordered collection and calls its [`Persistence`]
//! after every mutation.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] merges a remote batch into the store. The remote side
//! wins when the same text carries a different category; unseen quotes are
//! appended and identical ones skipped. The outcome is a [`SyncResult`].
//!
//! ## Quick Start
//!
//! ```rust
//! use quotesync_engine::{MemoryPersistence, QuoteRecord, Store, SyncResult};
//!
//! let mut store = Store::new(MemoryPersistence::new());
//! store.add("Be bold", "Wisdom").unwrap();
//!
//! let batch = vec![
//!     QuoteRecord::new("Be bold", "Courage").unwrap(),
//!     QuoteRecord::new("Stay curious", "Life").unwrap(),
//! ];
//! let result = store.reconcile(batch).unwrap();
//!
//! assert_eq!(result, SyncResult { added_count: 1, conflict_count: 1 });
//! assert_eq!(store.list(Some("Courage")).len(), 1);
//! ```
//!
//! ## Import and Export
//!
//! [`Store::export_json`] and [`Store::import_json`] use the format in
//! [`snapshot`]: a JSON array of `{text, category}` objects.

pub mod error;
pub mod reconcile;
pub mod record;
pub mod snapshot;
pub mod store;

// Re-export main types at crate root
pub use error::{Error, Field};
pub use reconcile::{Conflict, ReconcileReport, Reconciler, SyncResult};
pub use record::QuoteRecord;
pub use store::{
    default_quotes, Collection, ImportSummary, MemoryPersistence, Persistence, Store,
    ALL_CATEGORIES,
};
