//! Policy traits for budget-driven eviction.
//!
//! The core cache engine ([`FrequencyCache`](crate::cache::frequency::FrequencyCache))
//! decides *which* entry to evict (lowest frequency, least recently touched
//! among ties). An [`EvictionPolicy`] decides *whether* to evict and keeps
//! whatever aggregate accounting the budget needs.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                  FrequencyCache<K, V, P>                         │
//!   │                                                                  │
//!   │   put ──► on_inserted ──► while is_over_budget(len):             │
//!   │                               pop_min ──► on_removed(Evicted)    │
//!   │                                                                  │
//!   │   get (expired) ──► on_removed(Expired)                          │
//!   │   remove        ──► on_removed(Removed)                          │
//!   │   put (resident)──► on_removed(Replaced) + on_inserted           │
//!   │   clear         ──► on_cleared   (no per-entry callbacks)        │
//!   └───────────────────────────────┬──────────────────────────────────┘
//!                                   │
//!                 ┌─────────────────┴──────────────────┐
//!                 ▼                                    ▼
//!   ┌───────────────────────────┐        ┌───────────────────────────┐
//!   │ EntryCountPolicy          │        │ ByteBudget<W>             │
//!   │ len > capacity            │        │ used_bytes > capacity     │
//!   └───────────────────────────┘        └───────────────────────────┘
//! ```
//!
//! ## Writing a Policy
//!
//! ```
//! use freqcache::cache::frequency::FrequencyCache;
//! use freqcache::traits::{EvictionPolicy, RemovalCause};
//!
//! /// Bounds the total number of characters held.
//! #[derive(Debug, Default)]
//! struct CharBudget {
//!     limit: usize,
//!     used: usize,
//! }
//!
//! impl EvictionPolicy<u32, String> for CharBudget {
//!     fn is_over_budget(&self, _len: usize) -> bool {
//!         self.used > self.limit
//!     }
//!     fn on_inserted(&mut self, _key: &u32, value: &String) {
//!         self.used += value.len();
//!     }
//!     fn on_removed(&mut self, _key: &u32, value: &String, _cause: RemovalCause) {
//!         self.used -= value.len();
//!     }
//!     fn on_cleared(&mut self) {
//!         self.used = 0;
//!     }
//! }
//!
//! let mut cache = FrequencyCache::with_policy(CharBudget { limit: 8, used: 0 });
//! cache.put(1, "hello".to_string());
//! cache.put(2, "world".to_string()); // 10 chars > 8: key 1 is evicted
//! assert!(!cache.contains(&1));
//! assert_eq!(cache.policy().used, 5);
//! ```

use std::fmt;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Chosen by the eviction loop because the policy reported over budget.
    Evicted,
    /// Found idle past the sliding timeout.
    Expired,
    /// Removed explicitly by the caller.
    Removed,
    /// Displaced by a `put` of a new value for the same key.
    Replaced,
}

impl RemovalCause {
    /// Short lowercase label, suitable for log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            RemovalCause::Evicted => "evicted",
            RemovalCause::Expired => "expired",
            RemovalCause::Removed => "removed",
            RemovalCause::Replaced => "replaced",
        }
    }
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pluggable capacity rule and accounting hooks for
/// [`FrequencyCache`](crate::cache::frequency::FrequencyCache).
///
/// Hooks run inside the same `&mut` borrow as the structural change they
/// describe, so aggregates kept here can never drift from the resident set.
pub trait EvictionPolicy<K, V> {
    /// Returns `true` while the cache must keep evicting. `len` is the
    /// current number of resident entries.
    fn is_over_budget(&self, len: usize) -> bool;

    /// Called after `value` became resident under `key`.
    fn on_inserted(&mut self, _key: &K, _value: &V) {}

    /// Called after `value` stopped being resident under `key`.
    fn on_removed(&mut self, _key: &K, _value: &V, _cause: RemovalCause) {}

    /// Called once when the cache is cleared in bulk. No per-entry
    /// [`on_removed`](Self::on_removed) calls accompany a clear.
    fn on_cleared(&mut self) {}
}
