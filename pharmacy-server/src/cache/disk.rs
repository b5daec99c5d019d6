//! Disk snapshot for the cache store.
//!
//! Lets a warm cache survive a process restart: entries are written out
//! with their absolute expiry instants and re-inserted on hydration if
//! still in the future. Load failures (missing file, corrupt JSON) are
//! reported as "nothing restored": a cold cache, never a hard error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{CacheStore, CacheValue, Entry};

/// On-disk layout. Encode/decode must round-trip every `CacheValue` shape
/// exactly, nested maps included.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    saved_at: DateTime<Utc>,
    entries: BTreeMap<String, SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    value: CacheValue,
    expires_at: DateTime<Utc>,
}

/// Errors from writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Failed to serialize the snapshot
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON-file persistence for a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct DiskCache {
    path: PathBuf,
}

impl DiskCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all live entries of `store` to disk, creating parent
    /// directories as needed. Returns the number of entries written.
    pub fn persist(&self, store: &CacheStore) -> Result<usize, SnapshotError> {
        let entries: BTreeMap<String, SnapshotEntry> = store
            .live_entries()
            .into_iter()
            .map(|(key, entry)| {
                (
                    key,
                    SnapshotEntry {
                        value: (*entry.value).clone(),
                        expires_at: entry.expires_at,
                    },
                )
            })
            .collect();

        let snapshot = Snapshot {
            saved_at: Utc::now(),
            entries,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, json)?;

        Ok(snapshot.entries.len())
    }

    /// Restore unexpired entries into `store`, keeping their original
    /// expiry instants. Returns the number restored; 0 when the file is
    /// missing, unreadable or corrupt.
    pub async fn hydrate(&self, store: &CacheStore) -> usize {
        let Some(snapshot) = self.load() else {
            return 0;
        };

        let now = Utc::now();
        let mut restored = 0;
        for (key, entry) in snapshot.entries {
            if entry.expires_at <= now {
                continue;
            }
            store
                .insert_entry(
                    key,
                    Entry {
                        value: Arc::new(entry.value),
                        expires_at: entry.expires_at,
                    },
                )
                .await;
            restored += 1;
        }
        restored
    }

    fn load(&self) -> Option<Snapshot> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&contents).ok()
    }
}
