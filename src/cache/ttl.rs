//! In-memory TTL cache with a last-known-valid shadow store.
//!
//! Every operation runs inside one critical section so the hit/miss counters
//! always agree with the entry map. The lock is never held across I/O.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Deadline used when `now + ttl` is not representable (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A value together with the instant it stops being served.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug)]
struct CacheInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Last value ever stored per key. Replaced on `set`, never removed.
    last_valid: HashMap<K, V>,
    hits: u64,
    misses: u64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries that have not yet expired.
    pub live_keys: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe key/value cache with per-entry expiry.
///
/// Expired entries are never returned; they are purged by the `get` that
/// observes them. Values written with [`TtlCache::set`] are also kept in a
/// shadow store that never expires, readable with [`TtlCache::get_last_valid`].
#[derive(Debug)]
pub struct TtlCache<K, V> {
    inner: Mutex<CacheInner<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                last_valid: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<K, V>> {
        // The map stays structurally valid even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a live entry, counting a hit or a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let lookup = inner
            .entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                inner.hits += 1;
                Some(value)
            }
            Some(None) => {
                inner.entries.remove(key);
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store `value` for `ttl` and make it the last known-valid value for `key`.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let mut inner = self.lock();
        inner.last_valid.insert(key.clone(), value.clone());
        inner.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// The most recent value ever stored for `key`, regardless of expiry.
    pub fn get_last_valid<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().last_valid.get(key).cloned()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let inner = self.lock();
        CacheStats {
            live_keys: inner.entries.values().filter(|e| e.is_live(now)).count(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_saturates_instead_of_overflowing() {
        let cache = TtlCache::new();
        cache.set("products", 1, Duration::from_secs(u64::MAX));
        cache.set("other", 2, Duration::MAX);

        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert_eq!(cache.get(&"products"), Some(1));
        assert_eq!(cache.get(&"other"), Some(2));
        assert_eq!(cache.stats().live_keys, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_fresh_value_and_counts_hit() {
        let cache = TtlCache::new();
        cache.set("products", vec![1, 2, 3], Duration::from_secs(120));

        assert_eq!(cache.get(&"products"), Some(vec![1, 2, 3]));
        assert_eq!(
            cache.stats(),
            CacheStats {
                live_keys: 1,
                hits: 1,
                misses: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_key_counts_miss() {
        let cache: TtlCache<&str, u32> = TtlCache::new();
        assert_eq!(cache.get(&"absent"), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_purged_on_read() {
        let cache = TtlCache::new();
        cache.set("k", "v", Duration::from_secs(2));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"k"), Some("v"));

        // expiry <= now is already expired
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.stats().live_keys, 0);
        assert_eq!(cache.get(&"k"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(cache.lock().entries.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_valid_survives_expiry() {
        let cache = TtlCache::new();
        cache.set("k", 7, Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(cache.get(&"k"), None);
        assert_eq!(cache.get_last_valid(&"k"), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_last_valid() {
        let cache = TtlCache::new();
        cache.set("k", 1, Duration::from_secs(10));
        cache.set("k", 2, Duration::from_secs(10));

        assert_eq!(cache.get_last_valid(&"k"), Some(2));
        assert_eq!(cache.get(&"k"), Some(2));
        assert_eq!(cache.get_last_valid(&"other"), None);
    }

    #[test]
    fn test_concurrent_access_keeps_counters_consistent() {
        let cache = Arc::new(TtlCache::new());
        cache.set(0u32, 0u32, Duration::from_secs(600));

        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..500u32 {
                        if i % 5 == 0 {
                            cache.set(t, i, Duration::from_secs(600));
                        }
                        cache.get(&(i % 16));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8 * 500);
        assert_eq!(stats.live_keys, 8);
    }
}
