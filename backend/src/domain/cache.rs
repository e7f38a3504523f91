//! In-process TTL cache for aggregation results.
//!
//! Dashboard refreshes hammer the same handful of aggregations, so results
//! are memoised for a bounded window to keep load off the warehouse. The
//! cache is process-wide state with no persistence: entries expire by TTL
//! or by capacity eviction, never by explicit invalidation, and nothing
//! survives a restart.
//!
//! Eviction is oldest-write-time, not least-recently-used: when an insert
//! pushes the store over capacity, the entry with the smallest stored
//! timestamp is removed. This approximates LRU and is kept as-is for
//! behavioural compatibility with the dashboards tuned against it.
//!
//! The internal lock is never held across the compute future, so two
//! concurrent misses for the same key both recompute and both store. The
//! cache makes no at-most-once promise for in-flight identical calls; this
//! is a documented, accepted weakness.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Cache key: a structurally unambiguous encoding of (function name,
/// argument list).
///
/// Arguments are JSON-encoded as a tuple with the function name, so keys
/// cannot collide across functions or across argument boundaries the way
/// naive string concatenation can.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key for `function` called with `args`.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::cache::CacheKey;
    ///
    /// let all_time = CacheKey::new("top_users", &(false,));
    /// let this_year = CacheKey::new("top_users", &(true,));
    /// assert_ne!(all_time, this_year);
    /// ```
    pub fn new<A: Serialize>(function: &str, args: &A) -> Self {
        // The argument domain is booleans and short string lists; encoding
        // cannot realistically fail, but fall back to the bare function
        // name rather than panic if it ever does.
        let encoded = serde_json::to_string(&(function, args))
            .unwrap_or_else(|_| function.to_owned());
        Self(encoded)
    }

    /// The encoded key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct Entry {
    value: serde_json::Value,
    stored_at: DateTime<Utc>,
}

/// Bounded, time-limited memoisation of aggregation results.
///
/// Shared by reference across every aggregation function; construct one
/// per process (tests construct one per test).
pub struct TtlCache {
    ttl: TimeDelta,
    max_size: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl TtlCache {
    /// Create a cache holding values for `ttl_seconds` with at most
    /// `max_size` entries.
    pub fn new(ttl_seconds: i64, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::seconds(ttl_seconds),
            max_size,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if it is still fresh; otherwise
    /// run `compute`, store its result, and return it.
    ///
    /// The store lock is released while `compute` runs, so concurrent
    /// misses for the same key are not de-duplicated (see module docs).
    pub async fn get_or_compute<T, F, Fut>(&self, key: CacheKey, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(hit) = self.fresh_value(&key) {
            match serde_json::from_value(hit) {
                Ok(value) => return value,
                Err(err) => {
                    // A shape mismatch means the cached encoding is stale
                    // relative to the running code; recompute.
                    warn!(key = key.as_str(), error = %err, "discarding undecodable cache entry");
                }
            }
        }

        let value = compute().await;
        self.store(&key, &value);
        value
    }

    /// Number of live entries, fresh or expired.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh_value(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let now = self.clock.utc();
        let entries = self.lock_entries();
        let entry = entries.get(key.as_str())?;
        if now - entry.stored_at < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn store<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "value not cacheable; skipping store");
                return;
            }
        };

        let stored_at = self.clock.utc();
        let mut entries = self.lock_entries();
        entries.insert(
            key.as_str().to_owned(),
            Entry {
                value: encoded,
                stored_at,
            },
        );

        while entries.len() > self.max_size {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            // A poisoned lock only means another thread panicked mid-insert;
            // the map itself is still usable for a cache.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
