//! File persistence for the quote store and sync metadata.

use crate::scheduler::SyncMeta;
use chrono::{DateTime, Utc};
use quotesync_engine::{error::Result, snapshot, Error, Persistence, QuoteRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Keeps the collection in a single JSON file, in the export format.
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// a crash mid-write leaves the previous collection intact.
///
/// Saves happen while the store lock is held. On a multi-threaded runtime the
/// file I/O runs under [`tokio::task::block_in_place`] so other tasks keep
/// being polled.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> Result<Option<Vec<QuoteRecord>>> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(None);
        };

        let quotes = snapshot::decode_collection(&bytes);
        if quotes.is_none() {
            tracing::warn!(
                path = %self.path.display(),
                "Persisted quotes are unreadable, starting from defaults"
            );
        }
        Ok(quotes)
    }

    fn save(&self, quotes: &[QuoteRecord]) -> Result<()> {
        let json = snapshot::export(quotes)?;
        write_atomic(&self.path, json.as_bytes())?;

        tracing::debug!(path = %self.path.display(), count = quotes.len(), "Saved quotes");
        Ok(())
    }
}

/// On-disk shape of the sync metadata.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncMetaRecord {
    last_sync: Option<DateTime<Utc>>,
}

/// Sync metadata kept in a JSON file next to the collection.
#[derive(Debug, Clone)]
pub struct SyncMetaFile {
    path: PathBuf,
}

impl SyncMetaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Metadata file beside a collection file: `quotes.json` pairs with
    /// `quotes.sync.json`.
    pub fn beside(quotes_path: &Path) -> Self {
        let stem = quotes_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "quotes".to_string());
        Self::new(quotes_path.with_file_name(format!("{}.sync.json", stem)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SyncMeta for SyncMetaFile {
    fn load_last_sync(&self) -> Option<DateTime<Utc>> {
        let bytes = match read_optional(&self.path) {
            Ok(bytes) => bytes?,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read sync metadata");
                return None;
            }
        };

        match serde_json::from_slice::<SyncMetaRecord>(&bytes) {
            Ok(record) => record.last_sync,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Sync metadata is unreadable, ignoring"
                );
                None
            }
        }
    }

    fn save_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
        let record = SyncMetaRecord { last_sync: Some(at) };
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        write_atomic(&self.path, &json)
    }
}

/// Run blocking file I/O, yielding the worker thread when the runtime allows.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Read a file, or `None` if it does not exist.
fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match blocking(|| fs::read(path)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Persistence(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    blocking(|| {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Persistence(format!("failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let temp = temp_path(path);
        fs::write(&temp, contents)
            .and_then(|_| fs::rename(&temp, path))
            .map_err(|e| Error::Persistence(format!("failed to write {}: {}", path.display(), e)))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "quotes.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
