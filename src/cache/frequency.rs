//! # Frequency Cache
//!
//! The core eviction engine: a hybrid LFU/LRU cache with sliding expiration
//! and a pluggable [`EvictionPolicy`] deciding when the cache is over budget.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                     FrequencyCache<K, V, P>                          │
//!   │                                                                      │
//!   │   ┌──────────────────────────────────┐   ┌────────────────────────┐  │
//!   │   │ entries: FxHashMap<K, CacheEntry>│   │ buckets:               │  │
//!   │   │                                  │   │ FrequencyBuckets<K>    │  │
//!   │   │  key ──► value                   │   │                        │  │
//!   │   │          frequency               │   │  freq=1: [c] [d]       │  │
//!   │   │          last_access             │   │  freq=3: [a]           │  │
//!   │   └──────────────────────────────────┘   │  min_freq ──► 1        │  │
//!   │                                          └────────────────────────┘  │
//!   │   policy: P        (is_over_budget + accounting hooks)               │
//!   │   timeout: Duration  (sliding, ZERO = never expires)                 │
//!   │   clock: Arc<dyn Clock>                                              │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction Flow
//!
//! ```text
//!   put(key, value)
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────┐
//!   │ Key resident?                                                      │
//!   │   YES → replace value, frequency = 1, move to tail of bucket 1     │
//!   │         on_removed(old, Replaced), on_inserted(new)                │
//!   │   NO  → new entry, frequency = 1, tail of bucket 1, on_inserted    │
//!   └────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────┐
//!   │ while policy.is_over_budget(len) && !empty:                        │
//!   │     victim = head of min_freq bucket (least recently touched)      │
//!   │     on_removed(victim, Evicted)                                    │
//!   └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Expiration
//!
//! Expiration is observed, not enforced: an entry idle for longer than
//! `timeout` is dropped the next time `get` finds it (or when the caller asks
//! for [`purge_expired`](FrequencyCache::purge_expired)). Until then it stays
//! resident and keeps counting against the budget. The eviction loop itself
//! does not look at timestamps.
//!
//! ## Thread Safety
//!
//! `FrequencyCache` is **not** thread-safe; `get` mutates recency state, so
//! every operation takes `&mut self`. Wrap it in a lock, as
//! [`ByteBudgetCache`](crate::cache::byte_budget::ByteBudgetCache) does.

use std::hash::Hash;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::clock::{Clock, MonotonicClock};
use crate::ds::FrequencyBuckets;
use crate::error::InvariantError;
use crate::policy::entry_count::EntryCountPolicy;
use crate::traits::{EvictionPolicy, RemovalCause};

/// Upper bound on the entries [`FrequencyCache::new`] allocates up front.
pub const MAX_PREALLOC: usize = 1024;

/// A resident value with its popularity and idle-time bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    frequency: u64,
    last_access: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            frequency: 1,
            last_access: now,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Accesses since the value was (re)inserted, counting the insertion.
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    /// `true` once the entry has been idle strictly longer than `timeout`.
    /// A zero timeout never expires.
    #[inline]
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        !timeout.is_zero() && now.saturating_duration_since(self.last_access) > timeout
    }
}

/// Frequency-ordered cache with pluggable budget policy.
///
/// See the module-level documentation for details.
#[derive(Debug)]
pub struct FrequencyCache<K, V, P = EntryCountPolicy>
where
    K: Eq + Hash + Clone,
{
    entries: FxHashMap<K, CacheEntry<V>>,
    buckets: FrequencyBuckets<K>,
    policy: P,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> FrequencyCache<K, V, EntryCountPolicy>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries, without expiration.
    pub fn new(capacity: usize) -> Self {
        let prealloc = capacity.min(MAX_PREALLOC);
        let mut cache = Self::with_policy(EntryCountPolicy::new(capacity));
        cache.entries.reserve(prealloc);
        cache.buckets = FrequencyBuckets::with_capacity(prealloc);
        cache
    }

    /// Returns the configured entry capacity.
    pub fn capacity(&self) -> usize {
        self.policy.capacity()
    }
}

impl<K, V, P> FrequencyCache<K, V, P>
where
    K: Eq + Hash + Clone,
    P: EvictionPolicy<K, V>,
{
    /// Creates a cache whose budget is decided by `policy`, without expiration.
    pub fn with_policy(policy: P) -> Self {
        Self {
            entries: FxHashMap::default(),
            buckets: FrequencyBuckets::new(),
            policy,
            timeout: Duration::ZERO,
            clock: Arc::new(MonotonicClock),
        }
    }

    /// Sets the sliding expiration timeout. `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.set_clock(clock);
        self
    }

    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    /// Returns the sliding expiration timeout (`Duration::ZERO` when disabled).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of resident entries, including expired ones not yet observed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Looks up `key`, counting the access.
    ///
    /// A hit bumps the entry's frequency, makes it the most recent key of its
    /// new bucket, and restarts its idle timer. An expired entry is removed
    /// (firing [`RemovalCause::Expired`]) and reported as a miss.
    ///
    /// ```
    /// use freqcache::cache::frequency::FrequencyCache;
    ///
    /// let mut cache = FrequencyCache::new(4);
    /// cache.put("k", 7);
    /// assert_eq!(cache.get(&"k"), Some(&7));
    /// assert_eq!(cache.frequency(&"k"), Some(2));
    /// assert_eq!(cache.get(&"missing"), None);
    /// ```
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        let expired = self.entries.get(key)?.is_expired(now, self.timeout);
        if expired {
            self.remove_with_cause(key, RemovalCause::Expired);
            return None;
        }

        let frequency = self.buckets.touch(key)?;
        let entry = self.entries.get_mut(key)?;
        entry.frequency = frequency;
        entry.last_access = now;
        Some(&entry.value)
    }

    /// Inserts or replaces the value for `key`, then evicts until the policy
    /// is satisfied or the cache is empty.
    ///
    /// A replaced value starts its popularity over at frequency 1. Returns
    /// the displaced value, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let now = self.clock.now();
        let previous = match self.entries.get_mut(&key) {
            Some(entry) => {
                let old = mem::replace(&mut entry.value, value);
                entry.frequency = 1;
                entry.last_access = now;
                self.buckets.reset(&key);
                self.policy.on_removed(&key, &old, RemovalCause::Replaced);
                self.policy.on_inserted(&key, &entry.value);
                Some(old)
            },
            None => {
                self.buckets.insert(key.clone());
                self.policy.on_inserted(&key, &value);
                self.entries.insert(key, CacheEntry::new(value, now));
                None
            },
        };

        self.evict_over_budget();
        previous
    }

    /// Removes `key`, firing [`RemovalCause::Removed`]. No-op when absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_with_cause(key, RemovalCause::Removed)
    }

    /// Drops every entry at once.
    ///
    /// No per-entry `on_removed` calls are made; the policy receives a single
    /// [`on_cleared`](EvictionPolicy::on_cleared) instead and resets its
    /// aggregates in the same step.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.buckets.clear();
        self.policy.on_cleared();
    }

    /// `true` if `key` is resident and not expired. Does not count as an access.
    pub fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// `true` if `key` is resident, whether or not it has expired.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the value for `key` without counting an access. Expired
    /// entries read as absent but are left in place.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let entry = self.entries.get(key)?;
        if entry.is_expired(self.clock.now(), self.timeout) {
            return None;
        }
        Some(&entry.value)
    }

    /// Returns the resident entry for `key`, expired or not.
    pub fn entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Current access frequency of `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.buckets.frequency(key)
    }

    /// The entry the eviction loop would pick next, with its frequency.
    pub fn peek_victim(&self) -> Option<(&K, u64)> {
        self.buckets.peek_min()
    }

    /// Iterates resident entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, entry)| (key, &entry.value))
    }

    /// Removes every entry idle past the timeout, firing
    /// [`RemovalCause::Expired`] for each. Returns how many were removed.
    ///
    /// Never runs implicitly.
    pub fn purge_expired(&mut self) -> usize {
        if self.timeout.is_zero() {
            return 0;
        }
        let now = self.clock.now();
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.timeout))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove_with_cause(key, RemovalCause::Expired);
        }
        expired.len()
    }

    /// Verifies that entries and frequency buckets describe the same set.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.buckets.check_invariants()?;
        if self.entries.len() != self.buckets.len() {
            return Err(InvariantError::new(format!(
                "{} entries but {} keys in frequency buckets",
                self.entries.len(),
                self.buckets.len()
            )));
        }
        for (key, entry) in &self.entries {
            if self.buckets.frequency(key) != Some(entry.frequency) {
                return Err(InvariantError::new(
                    "entry frequency disagrees with its bucket",
                ));
            }
            if entry.frequency == 0 {
                return Err(InvariantError::new("entry frequency is zero"));
            }
        }
        Ok(())
    }

    fn remove_with_cause(&mut self, key: &K, cause: RemovalCause) -> Option<V> {
        let (key, entry) = self.entries.remove_entry(key)?;
        self.buckets.remove(&key);
        trace!(frequency = entry.frequency, cause = cause.as_str(), "cache entry removed");
        self.policy.on_removed(&key, &entry.value, cause);
        Some(entry.value)
    }

    fn evict_over_budget(&mut self) -> usize {
        let mut evicted = 0;
        while !self.entries.is_empty() && self.policy.is_over_budget(self.entries.len()) {
            let Some((key, frequency)) = self.buckets.pop_min() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&key) {
                trace!(frequency, "cache entry evicted");
                self.policy.on_removed(&key, &entry.value, RemovalCause::Evicted);
                evicted += 1;
            }
        }
        evicted
    }
}
