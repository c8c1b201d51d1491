//! Reconciliation of a remote batch into the local store.
//!
//! The remote side is authoritative over categories; quote text is the
//! natural key.
//!
//! # Algorithm
//!
//! For each remote quote, in batch order:
//!
//! 1. Find the first local quote with the same text key
//! 2. If found and its exact key differs, replace it in place (remote wins)
//! 3. Otherwise, if no local quote has the same exact key, append it
//! 4. Otherwise do nothing
//!
//! The loop never yields and persists at most once, after the whole batch.

use crate::{error::Result, QuoteRecord, Store};
use serde::{Deserialize, Serialize};

/// Counts produced by one reconciliation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Remote quotes appended
    pub added_count: usize,
    /// Local quotes replaced by a remote quote with a different category
    pub conflict_count: usize,
}

impl SyncResult {
    /// Whether the attempt changed the collection.
    pub fn has_changes(&self) -> bool {
        self.added_count > 0 || self.conflict_count > 0
    }
}

/// A local quote that lost to a remote one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// Position of the replaced quote
    pub index: usize,
    /// The local quote before replacement
    pub local: QuoteRecord,
    /// The remote quote that replaced it
    pub remote: QuoteRecord,
}

/// What happened to a single remote quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeOutcome {
    Added,
    Replaced,
    Unchanged,
}

/// Result of a reconciliation with per-conflict detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub result: SyncResult,
    pub conflicts: Vec<Conflict>,
}

/// Merges remote batches into a [`Store`].
pub struct Reconciler<'a> {
    store: &'a mut Store,
    report: ReconcileReport,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over a store.
    pub fn new(store: &'a mut Store) -> Self {
        Self {
            store,
            report: ReconcileReport::default(),
        }
    }

    /// Merge a batch and return the counts.
    pub fn merge(self, batch: Vec<QuoteRecord>) -> Result<SyncResult> {
        self.merge_detailed(batch).map(|report| report.result)
    }

    /// Merge a batch and return the counts along with every conflict.
    ///
    /// The store is persisted once if anything changed. If that save fails
    /// the merged state stays in memory and the error is returned.
    pub fn merge_detailed(mut self, batch: Vec<QuoteRecord>) -> Result<ReconcileReport> {
        for remote in batch {
            match self.merge_one(remote)? {
                MergeOutcome::Added => self.report.result.added_count += 1,
                MergeOutcome::Replaced => self.report.result.conflict_count += 1,
                MergeOutcome::Unchanged => {}
            }
        }

        if self.report.result.has_changes() {
            self.store.persist()?;
        }

        Ok(self.report)
    }

    fn merge_one(&mut self, remote: QuoteRecord) -> Result<MergeOutcome> {
        let remote_exact = remote.exact_key();
        let collection = self.store.collection();

        if let Some(index) = collection.position_by_text_key(&remote.text_key()) {
            let local_differs = collection
                .get(index)
                .is_some_and(|local| local.exact_key() != remote_exact);

            if local_differs {
                let local = self.store.replace_at(index, remote.clone())?;
                self.report.conflicts.push(Conflict {
                    index,
                    local,
                    remote,
                });
                return Ok(MergeOutcome::Replaced);
            }
        }

        if self.store.collection().contains_exact_key(&remote_exact) {
            return Ok(MergeOutcome::Unchanged);
        }

        self.store.push(remote);
        Ok(MergeOutcome::Added)
    }
}
