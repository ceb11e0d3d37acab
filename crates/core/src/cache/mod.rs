//! Bounded, time-expiring in-memory result cache.
//!
//! Maps the literal requested URL to its computed value. Entries expire
//! `ttl` after insertion and are never returned past that point. When the
//! store is full, the least-recently-used entry is evicted.
//!
//! Time is read from `tokio::time::Instant`, so tests drive expiry with a
//! paused runtime clock.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default capacity (entries).
pub const DEFAULT_CAPACITY: usize = 100;

/// Default time-to-live (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// A cached value with its lifetime bounds.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
    pub expires_at: Instant,
    last_used: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// access tick -> key, oldest first
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl<V> Inner<V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.last_used);
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove(&key);
        }
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// LRU + TTL cache shared across requests.
///
/// The lock is only held for the duration of a single map operation and
/// never across an await on other work.
#[derive(Debug)]
pub struct ResultCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache. A zero capacity is treated as 1.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner { entries: HashMap::new(), recency: BTreeMap::new(), tick: 0 }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value if present and not expired.
    ///
    /// A hit refreshes the entry's recency; an expired entry is dropped.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        let expired = inner.entries.get(key)?.is_expired(now);
        if expired {
            inner.remove(key);
            tracing::debug!("cache entry expired for {}", key);
            return None;
        }

        let tick = inner.next_tick();
        let entry = inner.entries.get_mut(key)?;
        let previous = std::mem::replace(&mut entry.last_used, tick);
        let value = entry.value.clone();
        inner.recency.remove(&previous);
        inner.recency.insert(tick, key.to_string());

        Some(value)
    }

    /// Insert or replace `key` with a fresh expiry of `now + ttl`.
    pub async fn set(&self, key: &str, value: V) {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        inner.remove(key);

        if inner.entries.len() >= self.capacity {
            inner.purge_expired(now);
        }
        while inner.entries.len() >= self.capacity {
            match inner.evict_lru() {
                Some(evicted) => tracing::debug!("cache evicted {}", evicted),
                None => break,
            }
        }

        let tick = inner.next_tick();
        inner.recency.insert(tick, key.to_string());
        inner.entries.insert(
            key.to_string(),
            CacheEntry { value, inserted_at: now, expires_at: now + self.ttl, last_used: tick },
        );
    }

    /// Remove a single key. Returns whether it was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.inner.lock().await.remove(key).is_some()
    }

    /// Number of stored entries, including any not yet purged after expiry.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.recency.clear();
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
