//! Async cache store with per-entry TTL.
//!
//! Each entry carries its own expiry instant (duty lists expire at the next
//! rotation boundary, aggregates a week out), so the store attaches an
//! expiry policy reading the instant from the entry rather than using a
//! cache-wide time-to-live. Expiry is enforced at read time; there is no
//! background eviction requirement.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::Expiry;
use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};

use crate::domain::{PharmacyRecord, Place};
use crate::index::{CityDistrictIndex, CityIndex};

/// Default maximum number of cached entries.
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// A cached payload.
///
/// The shapes the site caches are few and known; tagging them keeps the
/// store type-safe instead of "whatever shape the last writer chose".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CacheValue {
    /// A flat duty list (one city, or one city/district pair).
    PharmacyList(Vec<PharmacyRecord>),
    /// The full duty list grouped by city.
    CityMap(CityIndex),
    /// The full duty list grouped by city, then district.
    CityDistrictMap(CityDistrictIndex),
    /// Pharmacies-per-place counts, keyed by folded place name.
    CountMap(BTreeMap<String, usize>),
    /// A canonical city or district list.
    Places(Vec<Place>),
}

/// One live entry: shared value plus its absolute expiry instant.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) value: Arc<CacheValue>,
    pub(crate) expires_at: DateTime<Utc>,
}

impl Entry {
    fn remaining(&self) -> Duration {
        (self.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Expiry policy that reads each entry's own expiry instant.
struct PerEntryExpiry;

impl Expiry<String, Entry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.remaining())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite carries its own TTL; the old deadline must not win.
        Some(entry.remaining())
    }
}

/// Async key→value store with per-entry expiry.
///
/// Cheap to clone; clones share the same cache. Mutations on one key are
/// serialized by the underlying cache, so concurrent `set`s cannot
/// interleave partial updates. Returned values are shared read-only.
#[derive(Clone)]
pub struct CacheStore {
    inner: MokaCache<String, Entry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self { inner }
    }

    /// The stored value, or a miss. An expired entry is a miss; a stored
    /// empty list is not.
    pub async fn get(&self, key: &str) -> Option<Arc<CacheValue>> {
        let entry = self.inner.get(key).await?;
        if entry.expires_at <= Utc::now() {
            return None;
        }
        Some(entry.value)
    }

    /// Store `value` under `key` with an expiry of now + `ttl`, replacing
    /// any prior entry. Returns the shared handle to the stored value.
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: CacheValue,
        ttl: Duration,
    ) -> Arc<CacheValue> {
        let value = Arc::new(value);
        let entry = Entry {
            value: Arc::clone(&value),
            expires_at: Utc::now() + ttl,
        };
        self.inner.insert(key.into(), entry).await;
        value
    }

    /// Remove an entry unconditionally.
    pub async fn delete(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Approximate number of live entries (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Snapshot of all unexpired entries, for disk persistence.
    pub(crate) fn live_entries(&self) -> Vec<(String, Entry)> {
        let now = Utc::now();
        self.inner
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(key, entry)| ((*key).clone(), entry))
            .collect()
    }

    /// Re-insert an entry with a pre-computed expiry (disk hydration).
    pub(crate) async fn insert_entry(&self, key: String, entry: Entry) {
        self.inner.insert(key, entry).await;
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
