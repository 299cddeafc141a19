//! In-memory TTL cache with insertion-order eviction.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
    /// Insertion sequence number; lower is older.
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.ttl
    }
}

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Default TTL in seconds
    pub default_ttl_seconds: u64,
    /// Whether to drop expired entries before evicting live ones
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_seconds: 3600,
            auto_cleanup: true,
        }
    }
}

impl CacheConfig {
    /// Creates a config with the given ceiling and TTL.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries,
            default_ttl_seconds: ttl.as_secs(),
            auto_cleanup: true,
        }
    }

    /// Default TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

/// How keys are normalized before every lookup and store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Keys are used verbatim (content identifiers are case-sensitive).
    #[default]
    Exact,
    /// Keys are trimmed and lowercased (wallet addresses).
    CaseInsensitive,
}

impl KeyPolicy {
    fn apply(self, key: &str) -> String {
        match self {
            KeyPolicy::Exact => key.to_string(),
            KeyPolicy::CaseInsensitive => key.trim().to_lowercase(),
        }
    }
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

/// Thread-safe in-memory cache with TTL expiry and a hard entry ceiling.
///
/// Expired entries are treated as absent by [`get`](Self::get) even while
/// still stored. When an insertion pushes the entry count over
/// `max_entries`, the oldest-inserted entry is removed (insertion order,
/// not access order). Replacing a key counts as a fresh insertion.
pub struct TtlCache<V> {
    inner: RwLock<Inner<V>>,
    config: CacheConfig,
    key_policy: KeyPolicy,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::with_capacity(config.max_entries.min(4096)),
                next_seq: 0,
            }),
            config,
            key_policy: KeyPolicy::Exact,
        }
    }

    /// Sets the key normalization policy.
    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Gets a cached value by key.
    ///
    /// Returns None if not cached or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let key = self.key_policy.apply(key);
        let now = Instant::now();
        let inner = self.inner.read();
        inner
            .entries
            .get(&key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
    }

    /// Returns true if a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Caches a value with the default TTL.
    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.config.ttl());
    }

    /// Caches a value with a custom TTL.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let key = self.key_policy.apply(key);
        let now = Instant::now();
        let mut inner = self.inner.write();

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                ttl,
                seq,
            },
        );

        if self.config.auto_cleanup && inner.entries.len() > self.config.max_entries {
            inner.entries.retain(|_, e| !e.is_expired(now));
        }

        while inner.entries.len() > self.config.max_entries {
            let Some(oldest_key) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            inner.entries.remove(&oldest_key);
        }
    }

    /// Removes a cached entry.
    pub fn remove(&self, key: &str) {
        let key = self.key_policy.apply(key);
        self.inner.write().entries.remove(&key);
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.inner.write().entries.clear();
    }

    /// Removes all expired entries.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.inner.write().entries.retain(|_, e| !e.is_expired(now));
    }

    /// Returns the number of stored entries (including expired ones not yet removed).
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let inner = self.inner.read();
        let expired = inner.entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            total_entries: inner.entries.len(),
            expired_entries: expired,
            valid_entries: inner.entries.len().saturating_sub(expired),
            capacity: self.config.max_entries,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Maximum capacity
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_cache(max_entries: usize) -> TtlCache<u32> {
        TtlCache::with_config(CacheConfig {
            max_entries,
            default_ttl_seconds: 3600,
            auto_cleanup: true,
        })
    }

    #[test]
    fn test_cache_set_get() {
        let cache = TtlCache::new();
        cache.set("QmA", 7u32);
        assert_eq!(cache.get("QmA"), Some(7));
    }

    #[test]
    fn test_exact_keys_are_case_sensitive() {
        let cache = TtlCache::new();
        cache.set("bafyABC", 1u32);
        assert!(cache.get("bafyabc").is_none());
    }

    #[test]
    fn test_case_insensitive_keys() {
        let cache = TtlCache::new().with_key_policy(KeyPolicy::CaseInsensitive);
        cache.set("0xABCdef", 1u32);
        assert_eq!(cache.get("0xabcdef"), Some(1));
        assert_eq!(cache.get("  0XABCDEF  "), Some(1));
    }

    #[test]
    fn test_cache_miss() {
        let cache: TtlCache<u32> = TtlCache::new();
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn test_cache_remove() {
        let cache = TtlCache::new();
        cache.set("a", 1u32);
        cache.remove("a");
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_cache_clear() {
        let cache = TtlCache::new();
        cache.set("a", 1u32);
        cache.set("b", 2u32);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_absent_before_eviction() {
        let cache: TtlCache<u32> =
            TtlCache::with_config(CacheConfig::new(10, Duration::from_secs(600)));
        cache.set("a", 1);

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(cache.get("a"), Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("a").is_none());
        // Still physically present until cleanup or eviction
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expired_entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let cache = small_cache(10);
        cache.set_with_ttl("a", 1, Duration::from_millis(1));
        cache.set("b", 2);

        tokio::time::advance(Duration::from_millis(10)).await;
        cache.cleanup_expired();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_capacity_evicts_oldest_inserted() {
        let cache = small_cache(2);
        cache.set("a", 1);
        cache.set("b", 2);
        // Reading "a" must not protect it: eviction is by insertion, not access
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_replace_counts_as_fresh_insertion() {
        let cache = small_cache(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        cache.set("c", 3);

        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a"), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_go_before_live_ones() {
        let cache = small_cache(2);
        cache.set("a", 1);
        cache.set_with_ttl("b", 2, Duration::from_millis(1));
        tokio::time::advance(Duration::from_millis(5)).await;
        cache.set("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_stats() {
        let cache = small_cache(5);
        cache.set("a", 1);
        cache.set("b", 2);
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 2);
        assert_eq!(stats.capacity, 5);
    }

    proptest! {
        #[test]
        fn prop_size_never_exceeds_ceiling(
            max_entries in 1usize..16,
            keys in proptest::collection::vec(0u8..32, 0..200),
        ) {
            let cache = small_cache(max_entries);
            for (i, k) in keys.iter().enumerate() {
                cache.set(&k.to_string(), i as u32);
                prop_assert!(cache.len() <= max_entries);
            }
            // The most recent insertion always survives
            if let Some(last) = keys.last() {
                prop_assert_eq!(cache.get(&last.to_string()), Some((keys.len() - 1) as u32));
            }
        }
    }
}
