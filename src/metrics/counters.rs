use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::traits::RemovalCause;

/// Lock-free counters for a [`ByteBudgetCache`](crate::cache::byte_budget::ByteBudgetCache).
///
/// All updates use `Ordering::Relaxed`; counters are observational and may be
/// momentarily inconsistent with each other.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    removes: AtomicU64,
    replacements: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    oversize_bypasses: AtomicU64,
    load_races: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one departure under the matching cause counter.
    #[inline]
    pub fn record_removal(&self, cause: RemovalCause) {
        let counter = match cause {
            RemovalCause::Evicted => &self.evictions,
            RemovalCause::Expired => &self.expirations,
            RemovalCause::Removed => &self.removes,
            RemovalCause::Replaced => &self.replacements,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_oversize_bypass(&self) {
        self.oversize_bypasses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_load_race(&self) {
        self.load_races.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            oversize_bypasses: self.oversize_bypasses.load(Ordering::Relaxed),
            load_races: self.load_races.load(Ordering::Relaxed),
        }
    }
}
