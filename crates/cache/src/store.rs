use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotguard_common::{CacheConfig, SharedClock};

use crate::pattern::CachePattern;

struct CacheEntry<V> {
    value: V,
    created: DateTime<Utc>,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Live iff the TTL is non-zero and `now - created <= ttl`.
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        // A clock that stepped backwards yields a negative age; treat it as fresh.
        let age = (now - self.created).to_std().unwrap_or(Duration::ZERO);
        age <= self.ttl
    }
}

/// Size and TTL settings of a [`QueryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub default_ttl_secs: u64,
}

/// Bounded key/value store with per-entry TTL.
///
/// Expired entries stay in memory until they are read or until an insert
/// finds the store full. At capacity the store first purges expired entries
/// and, if it is still full, evicts the oldest quarter by creation time.
/// That is cheaper than true LRU bookkeeping and good enough for read
/// acceleration.
pub struct QueryCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    max_size: usize,
    default_ttl: Duration,
    clock: SharedClock,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(max_size: usize, default_ttl: Duration, clock: SharedClock) -> Self {
        tracing::info!(max_size, default_ttl_secs = default_ttl.as_secs(), "creating query cache");
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size: max_size.max(1),
            default_ttl,
            clock,
        }
    }

    pub fn from_config(config: &CacheConfig, clock: SharedClock) -> Self {
        Self::new(config.max_size, config.default_ttl(), clock)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the live value for `key`; a dead entry is purged and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite `key`. `None` uses the default TTL; a zero TTL
    /// means the value is already expired and is not kept.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = self.clock.now();
        let mut entries = self.lock();

        if ttl.is_zero() {
            entries.remove(&key);
            tracing::trace!(key = %key, "zero ttl, value not cached");
            return;
        }

        if entries.len() >= self.max_size {
            let incoming = !entries.contains_key(&key);
            self.make_room(&mut entries, now, incoming);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                created: now,
                ttl,
            },
        );
    }

    /// Purge expired entries, then evict by age if a new key still has no room.
    fn make_room(
        &self,
        entries: &mut HashMap<String, CacheEntry<V>>,
        now: DateTime<Utc>,
        incoming: bool,
    ) {
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let expired = before - entries.len();

        let mut evicted = 0;
        if incoming && entries.len() >= self.max_size {
            // At least enough to fit the incoming key, even for tiny capacities.
            let count = (self.max_size / 4).max(entries.len() + 1 - self.max_size);

            let mut by_age: Vec<(DateTime<Utc>, String)> = entries
                .iter()
                .map(|(key, entry)| (entry.created, key.clone()))
                .collect();
            by_age.sort_unstable();

            for (_, key) in by_age.into_iter().take(count) {
                entries.remove(&key);
                evicted += 1;
            }
        }

        tracing::debug!(expired, evicted, remaining = entries.len(), "query cache at capacity");
    }

    /// Remove every key when `pattern` is `None`, otherwise only matching
    /// keys. Returns the number of entries removed.
    pub fn invalidate(&self, pattern: Option<&CachePattern>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();

        match pattern {
            None => entries.clear(),
            Some(pattern) => entries.retain(|key, _| !pattern.matches(key)),
        }

        before - entries.len()
    }

    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.max_size,
            default_ttl_secs: self.default_ttl.as_secs(),
        }
    }

    /// Physical entry count, including expired entries not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
