//! # Byte-Budget Cache
//!
//! Thread-safe [`FrequencyCache`] bounded by the summed byte weight of its
//! values, with a per-entry size ceiling and miss-time loading.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                    ByteBudgetCache<K, V, W>                          │
//!   │                                                                      │
//!   │   ┌──────────────────────────────────────────────────────────────┐   │
//!   │   │ Mutex<FrequencyCache<K, Arc<V>, ByteBudget<W>>>               │   │
//!   │   │   entries + frequency buckets + used_bytes (one lock)         │   │
//!   │   └──────────────────────────────────────────────────────────────┘   │
//!   │                                                                      │
//!   │   config: ByteBudgetConfig     immutable, read without locking       │
//!   │   weigher: W                   clone used for oversize checks        │
//!   │   used_bytes / cached_count    AtomicUsize mirrors, relaxed          │
//!   │   metrics: Arc<CacheMetrics>   shared with the ByteBudget policy     │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## `get_or_load`
//!
//! ```text
//!   lock ─► get(key) ─► hit? ──YES──► return cached Arc
//!   unlock     │
//!              NO
//!              ▼
//!   loader(&key)            (no lock held)
//!      │  Err ─────────────► return Err, nothing changes
//!      ▼
//!   weigh > max_entry_size? ──YES──► return value, never cached
//!      │
//!      ▼
//!   lock ─► live entry appeared meanwhile? ──YES──► return value, not inserted
//!      │
//!      ▼
//!   put(key, value) ─► evict LFU heads while used_bytes > capacity_bytes
//! ```
//!
//! Concurrent loaders of one absent key may all run; only the first to
//! re-lock inserts, so the key's weight is accounted once.
//!
//! ## Example
//!
//! ```
//! use freqcache::cache::byte_budget::ByteBudgetCache;
//! use freqcache::config::ByteBudgetConfig;
//!
//! let cache = ByteBudgetCache::new(ByteBudgetConfig::new(100).with_max_entry_size(60));
//!
//! let value = cache.get_or_load(&"a", |_| Ok(vec![0u8; 40])).unwrap();
//! assert_eq!(value.len(), 40);
//! assert_eq!(cache.used_size(), 40);
//!
//! // Served from the cache; the loader is not called.
//! let again = cache.get_or_load(&"a", |_| unreachable!()).unwrap();
//! assert_eq!(again.len(), 40);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::frequency::FrequencyCache;
use crate::clock::Clock;
use crate::config::ByteBudgetConfig;
use crate::error::{InvariantError, LoadError};
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::policy::byte_budget::{ByteBudget, ByteLen, Weigher};

type Inner<K, V, W> = FrequencyCache<K, Arc<V>, ByteBudget<W>>;

/// Byte-bounded, thread-safe frequency cache.
///
/// See the module-level documentation for details.
pub struct ByteBudgetCache<K, V, W = ByteLen>
where
    K: Eq + Hash + Clone,
{
    inner: Mutex<Inner<K, V, W>>,
    config: ByteBudgetConfig,
    weigher: W,
    used_bytes: AtomicUsize,
    cached_count: AtomicUsize,
    metrics: Arc<CacheMetrics>,
}

impl<K, V> ByteBudgetCache<K, V, ByteLen>
where
    K: Eq + Hash + Clone,
    V: AsRef<[u8]>,
{
    /// Creates a cache weighing values by their byte length.
    pub fn new(config: ByteBudgetConfig) -> Self {
        Self::with_weigher(config, ByteLen)
    }
}

impl<K, V, W> ByteBudgetCache<K, V, W>
where
    K: Eq + Hash + Clone,
    W: Weigher<V> + Clone,
{
    /// Creates a cache weighing values with `weigher`.
    pub fn with_weigher(config: ByteBudgetConfig, weigher: W) -> Self {
        let metrics = Arc::new(CacheMetrics::new());
        let policy =
            ByteBudget::with_metrics(config.capacity_bytes, weigher.clone(), Arc::clone(&metrics));
        let inner = FrequencyCache::with_policy(policy).with_timeout(config.timeout);
        Self {
            inner: Mutex::new(inner),
            config,
            weigher,
            used_bytes: AtomicUsize::new(0),
            cached_count: AtomicUsize::new(0),
            metrics,
        }
    }

    /// Replaces the time source used for expiration.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.inner.get_mut().set_clock(clock);
        self
    }

    /// Returns the cached value for `key`, counting the access.
    ///
    /// An entry idle past the timeout is dropped here and its bytes released.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let value = {
            let mut cache = self.inner.lock();
            let value = cache.get(key).map(Arc::clone);
            self.publish(&cache);
            value
        };
        match value {
            Some(_) => self.metrics.record_hit(),
            None => self.metrics.record_miss(),
        }
        value
    }

    /// Returns the cached value for `key`, or loads, admits, and returns it.
    ///
    /// The loader runs without the lock held. Its error is returned as-is and
    /// leaves the cache untouched. A loaded value heavier than
    /// [`max_entry_size`](Self::max_entry_size) is returned without being
    /// cached, so the next call loads again.
    pub fn get_or_load<F>(&self, key: &K, loader: F) -> Result<Arc<V>, LoadError>
    where
        F: FnOnce(&K) -> Result<V, LoadError>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = match loader(key) {
            Ok(value) => Arc::new(value),
            Err(err) => {
                self.metrics.record_load_failure();
                return Err(err);
            },
        };
        self.metrics.record_load();

        let weight = self.weigher.weigh(&*value);
        if self.config.is_oversize(weight) {
            self.metrics.record_oversize_bypass();
            debug!(
                weight,
                max_entry_size = self.config.max_entry_size,
                "loaded value bypasses cache"
            );
            return Ok(value);
        }

        let mut cache = self.inner.lock();
        if cache.contains(key) {
            drop(cache);
            self.metrics.record_load_race();
            debug!(weight, "key cached by a concurrent load; keeping existing entry");
            return Ok(value);
        }
        cache.put(key.clone(), Arc::clone(&value));
        let admitted = cache.contains_key(key);
        self.publish(&cache);
        drop(cache);
        if admitted {
            self.metrics.record_insert();
        }
        Ok(value)
    }

    /// Inserts `value` directly, replacing any resident value for `key`.
    ///
    /// Returns whether the value is resident afterwards. A value heavier than
    /// [`max_entry_size`](Self::max_entry_size) is rejected without touching
    /// the cache; a value heavier than the whole budget is admitted and then
    /// evicted along with everything else.
    pub fn put(&self, key: K, value: V) -> bool {
        let weight = self.weigher.weigh(&value);
        if self.config.is_oversize(weight) {
            self.metrics.record_oversize_bypass();
            debug!(
                weight,
                max_entry_size = self.config.max_entry_size,
                "value too large to cache"
            );
            return false;
        }

        let mut cache = self.inner.lock();
        cache.put(key.clone(), Arc::new(value));
        let admitted = cache.contains_key(&key);
        self.publish(&cache);
        drop(cache);
        if admitted {
            self.metrics.record_insert();
        }
        admitted
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let mut cache = self.inner.lock();
        let removed = cache.remove(key);
        self.publish(&cache);
        removed
    }

    /// Drops every entry and resets byte usage to zero in one step.
    ///
    /// Removal counters are not incremented for cleared entries.
    pub fn clear(&self) {
        let mut cache = self.inner.lock();
        let dropped = cache.len();
        cache.clear();
        self.publish(&cache);
        drop(cache);
        debug!(dropped, "cache cleared");
    }

    /// Removes every entry idle past the timeout. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let mut cache = self.inner.lock();
        let purged = cache.purge_expired();
        self.publish(&cache);
        drop(cache);
        if purged > 0 {
            debug!(purged, "expired entries purged");
        }
        purged
    }

    /// `true` if `key` is resident and not expired. Does not count as an access.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Current access frequency of a resident `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().frequency(key)
    }

    /// Byte budget the cache evicts down to.
    pub fn capacity(&self) -> usize {
        self.config.capacity_bytes
    }

    /// Summed weight of resident values as of the last completed operation.
    pub fn used_size(&self) -> usize {
        self.used_bytes.load(Ordering::Relaxed)
    }

    /// Largest admissible value weight; `0` when unlimited.
    pub fn max_entry_size(&self) -> usize {
        self.config.max_entry_size
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Resident entry count as of the last completed operation, including
    /// expired entries not yet observed.
    pub fn cached_count(&self) -> usize {
        self.cached_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.cached_count() == 0
    }

    pub fn config(&self) -> &ByteBudgetConfig {
        &self.config
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Verifies bucket bookkeeping, the byte total, and the published mirrors.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let cache = self.inner.lock();
        cache.check_invariants()?;

        let used = cache.policy().used_bytes();
        let summed: usize = cache
            .iter()
            .map(|(_, value)| cache.policy().weigher().weigh(&**value))
            .sum();
        if summed != used {
            return Err(InvariantError::new(format!(
                "used_bytes is {used} but resident values weigh {summed}"
            )));
        }
        if used > self.config.capacity_bytes && cache.len() > 1 {
            return Err(InvariantError::new(format!(
                "{used} bytes over a {} byte budget with {} entries",
                self.config.capacity_bytes,
                cache.len()
            )));
        }
        if self.used_bytes.load(Ordering::Relaxed) != used
            || self.cached_count.load(Ordering::Relaxed) != cache.len()
        {
            return Err(InvariantError::new("published size mirrors are stale"));
        }
        Ok(())
    }

    fn publish(&self, cache: &Inner<K, V, W>) {
        self.used_bytes
            .store(cache.policy().used_bytes(), Ordering::Relaxed);
        self.cached_count.store(cache.len(), Ordering::Relaxed);
    }
}

impl<K, V, W> fmt::Debug for ByteBudgetCache<K, V, W>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBudgetCache")
            .field("capacity_bytes", &self.config.capacity_bytes)
            .field("max_entry_size", &self.config.max_entry_size)
            .field("timeout", &self.config.timeout)
            .field("used_bytes", &self.used_bytes.load(Ordering::Relaxed))
            .field("cached_count", &self.cached_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache(capacity: usize, max_entry: usize) -> ByteBudgetCache<&'static str, Vec<u8>> {
        ByteBudgetCache::new(ByteBudgetConfig::new(capacity).with_max_entry_size(max_entry))
    }

    fn bytes(len: usize) -> Vec<u8> {
        vec![7u8; len]
    }

    mod construction {
        use super::*;

        #[test]
        fn ceiling_above_capacity_admits_values_up_to_the_budget() {
            let cache = cache(100, 150);
            assert!(cache.put("a", bytes(40)));
            assert!(cache.put("b", bytes(100)));
            // "a" was the least recently inserted at frequency 1.
            assert!(!cache.contains(&"a"));
            assert_eq!(cache.used_size(), 100);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn value_heavier_than_budget_evicts_itself() {
            let cache = cache(100, 150);
            cache.put("a", bytes(40));
            assert!(!cache.put("big", bytes(120)));
            assert_eq!(cache.cached_count(), 0);
            assert_eq!(cache.used_size(), 0);

            let loaded = cache.get_or_load(&"big", |_| Ok(bytes(150))).unwrap();
            assert_eq!(loaded.len(), 150);
            assert_eq!(cache.cached_count(), 0);
            assert_eq!(cache.metrics().oversize_bypasses, 0);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn zero_capacity_keeps_only_empty_values() {
            let cache = cache(0, 0);
            assert!(!cache.put("a", bytes(1)));
            assert!(cache.is_empty());
            assert!(cache.put("empty", Vec::new()));
            assert_eq!(cache.cached_count(), 1);
            assert_eq!(cache.used_size(), 0);
            assert_eq!(cache.metrics().evictions, 1);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn accessors_reflect_config() {
            let config = ByteBudgetConfig::new(100)
                .with_max_entry_size(60)
                .with_timeout(Duration::from_secs(5));
            let cache = ByteBudgetCache::<u32, Vec<u8>>::new(config);
            assert_eq!(cache.capacity(), 100);
            assert_eq!(cache.max_entry_size(), 60);
            assert_eq!(cache.timeout(), Duration::from_secs(5));
            assert_eq!(cache.config(), &config);
            assert_eq!(cache.used_size(), 0);
            assert!(cache.is_empty());
        }

        #[test]
        fn custom_weigher() {
            let cache: ByteBudgetCache<u32, String, _> = ByteBudgetCache::with_weigher(
                ByteBudgetConfig::new(10).with_max_entry_size(0),
                |s: &String| s.chars().count(),
            );
            assert!(cache.put(1, "ééééé".to_string()));
            assert_eq!(cache.used_size(), 5);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn is_send_and_sync() {
            fn assert_send_sync<T: Send + Sync>() {}
            assert_send_sync::<ByteBudgetCache<String, Vec<u8>>>();
        }
    }

    mod accounting {
        use super::*;

        #[test]
        fn put_tracks_bytes_and_count() {
            let cache = cache(100, 60);
            assert!(cache.put("a", bytes(30)));
            assert!(cache.put("b", bytes(20)));
            assert_eq!(cache.used_size(), 50);
            assert_eq!(cache.cached_count(), 2);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn replacing_adjusts_by_the_difference() {
            let cache = cache(100, 60);
            cache.put("a", bytes(30));
            cache.put("a", bytes(10));
            assert_eq!(cache.used_size(), 10);
            assert_eq!(cache.cached_count(), 1);
            assert_eq!(cache.metrics().replacements, 1);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn oversize_put_is_rejected() {
            let cache = cache(100, 60);
            assert!(!cache.put("big", bytes(61)));
            assert!(!cache.contains(&"big"));
            assert_eq!(cache.used_size(), 0);
            assert_eq!(cache.metrics().oversize_bypasses, 1);
        }

        #[test]
        fn exact_capacity_is_within_budget() {
            let cache = cache(100, 0);
            cache.put("a", bytes(60));
            cache.put("b", bytes(40));
            assert_eq!(cache.used_size(), 100);
            assert_eq!(cache.cached_count(), 2);
        }

        #[test]
        fn remove_releases_bytes() {
            let cache = cache(100, 60);
            cache.put("a", bytes(30));
            assert_eq!(cache.remove(&"a").map(|v| v.len()), Some(30));
            assert_eq!(cache.remove(&"a"), None);
            assert_eq!(cache.used_size(), 0);
            assert_eq!(cache.metrics().removes, 1);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn clear_resets_usage_without_removal_counts() {
            let cache = cache(100, 60);
            cache.put("a", bytes(30));
            cache.put("b", bytes(30));
            cache.clear();
            assert_eq!(cache.used_size(), 0);
            assert!(cache.is_empty());
            let metrics = cache.metrics();
            assert_eq!(metrics.evictions + metrics.removes, 0);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn unlimited_entry_larger_than_budget_evicts_everything_else() {
            let cache = cache(100, 0);
            assert!(cache.put("a", bytes(50)));
            assert!(!cache.put("huge", bytes(150)));
            // Nothing left to evict but the new entry itself.
            assert_eq!(cache.cached_count(), 0);
            assert_eq!(cache.used_size(), 0);

            let metrics = cache.metrics();
            assert_eq!(metrics.evictions, 2);
            assert_eq!(metrics.inserts, 1);
        }

        #[test]
        fn self_evicting_load_is_not_counted_as_insert() {
            let cache = cache(100, 0);
            let value = cache.get_or_load(&"huge", |_| Ok(bytes(150))).unwrap();
            assert_eq!(value.len(), 150);

            let metrics = cache.metrics();
            assert_eq!(metrics.loads, 1);
            assert_eq!(metrics.inserts, 0);
            assert_eq!(metrics.evictions, 1);
        }
    }

    mod loading {
        use super::*;
        use std::sync::atomic::AtomicUsize;

        #[test]
        fn miss_loads_and_caches() {
            let cache = cache(100, 60);
            let calls = AtomicUsize::new(0);
            let load = |_: &&str| {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok(bytes(10))
            };

            cache.get_or_load(&"a", load).unwrap();
            cache.get_or_load(&"a", load).unwrap();
            assert_eq!(calls.load(Ordering::Relaxed), 1);
            assert_eq!(cache.frequency(&"a"), Some(2));

            let metrics = cache.metrics();
            assert_eq!((metrics.hits, metrics.misses, metrics.loads), (1, 1, 1));
        }

        #[test]
        fn loader_error_is_forwarded_unchanged() {
            let cache = cache(100, 60);
            let err = cache
                .get_or_load(&"missing", |_| Err(LoadError::NotFound))
                .unwrap_err();
            assert!(err.is_not_found());
            assert!(cache.is_empty());
            assert_eq!(cache.metrics().load_failures, 1);
        }

        #[test]
        fn loader_receives_the_key() {
            let cache = cache(100, 60);
            let value = cache
                .get_or_load(&"abc", |key| Ok(key.as_bytes().to_vec()))
                .unwrap();
            assert_eq!(value.as_slice(), b"abc");
        }

        #[test]
        fn value_cached_during_load_wins() {
            let cache = cache(100, 60);
            let value = cache
                .get_or_load(&"a", |key| {
                    // The lock is not held while loading.
                    assert!(cache.put(*key, bytes(10)));
                    Ok(bytes(20))
                })
                .unwrap();

            assert_eq!(value.len(), 20);
            assert_eq!(cache.used_size(), 10);
            assert_eq!(cache.cached_count(), 1);
            assert_eq!(cache.get(&"a").map(|v| v.len()), Some(10));

            let metrics = cache.metrics();
            assert_eq!(metrics.load_races, 1);
            assert_eq!(metrics.inserts, 1);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn expired_entry_cached_during_load_is_replaced() {
            let clock = Arc::new(ManualClock::new());
            let cache: ByteBudgetCache<&str, Vec<u8>> = ByteBudgetCache::new(
                ByteBudgetConfig::new(100).with_timeout(Duration::from_millis(100)),
            )
            .with_clock(clock.clone());

            cache
                .get_or_load(&"a", |key| {
                    cache.put(*key, bytes(10));
                    clock.advance(Duration::from_millis(150));
                    Ok(bytes(20))
                })
                .unwrap();

            assert_eq!(cache.used_size(), 20);
            assert_eq!(cache.metrics().load_races, 0);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn oversize_load_is_returned_but_not_cached() {
            let cache = cache(100, 60);
            let value = cache.get_or_load(&"f", |_| Ok(bytes(70))).unwrap();
            assert_eq!(value.len(), 70);
            assert_eq!(cache.cached_count(), 0);
            assert_eq!(cache.metrics().oversize_bypasses, 1);
        }

        #[test]
        fn expired_entry_is_reloaded() {
            let clock = Arc::new(ManualClock::new());
            let cache: ByteBudgetCache<&str, Vec<u8>> = ByteBudgetCache::new(
                ByteBudgetConfig::new(100).with_timeout(Duration::from_millis(100)),
            )
            .with_clock(clock.clone());

            cache.get_or_load(&"a", |_| Ok(bytes(10))).unwrap();
            clock.advance(Duration::from_millis(150));
            let value = cache.get_or_load(&"a", |_| Ok(bytes(20))).unwrap();
            assert_eq!(value.len(), 20);
            assert_eq!(cache.used_size(), 20);
            assert_eq!(cache.metrics().expirations, 1);
            cache.check_invariants().unwrap();
        }
    }

    mod expiration {
        use super::*;

        #[test]
        fn purge_releases_idle_bytes() {
            let clock = Arc::new(ManualClock::new());
            let cache: ByteBudgetCache<&str, Vec<u8>> = ByteBudgetCache::new(
                ByteBudgetConfig::new(100).with_timeout(Duration::from_millis(100)),
            )
            .with_clock(clock.clone());

            cache.put("a", bytes(10));
            cache.put("b", bytes(10));
            clock.advance(Duration::from_millis(60));
            cache.get(&"b");
            clock.advance(Duration::from_millis(60));

            assert_eq!(cache.purge_expired(), 1);
            assert_eq!(cache.used_size(), 10);
            assert!(cache.contains(&"b"));
            cache.check_invariants().unwrap();
        }
    }
}
