//! Byte-budget eviction policy.
//!
//! Tracks the total weight (bytes) of resident values and reports over budget
//! once that total strictly exceeds the configured capacity. The triggering
//! insertion is always admitted first; the cache's eviction loop then brings
//! the total back under the limit before the operation returns.
//!
//! ```text
//!   capacity_bytes = 100
//!
//!   put A(40)  used=40          ok
//!   put B(40)  used=80          ok
//!   put C(40)  used=120 > 100   evict LFU head (A) ──► used=80
//!   put D(20)  used=100         ok (equality is within budget)
//! ```

use std::sync::Arc;

use crate::metrics::CacheMetrics;
use crate::traits::{EvictionPolicy, RemovalCause};

/// Measures the size a value occupies in the budget.
///
/// Must return the same weight for a value every time it is asked; the budget
/// subtracts on removal exactly what it added on insertion.
pub trait Weigher<V> {
    fn weigh(&self, value: &V) -> usize;
}

impl<V, F> Weigher<V> for F
where
    F: Fn(&V) -> usize,
{
    #[inline]
    fn weigh(&self, value: &V) -> usize {
        self(value)
    }
}

/// Weighs byte-like values by their length.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteLen;

impl<V> Weigher<V> for ByteLen
where
    V: AsRef<[u8]>,
{
    #[inline]
    fn weigh(&self, value: &V) -> usize {
        value.as_ref().len()
    }
}

/// [`EvictionPolicy`] bounding the summed weight of resident `Arc<V>` values.
pub struct ByteBudget<W> {
    capacity_bytes: usize,
    used_bytes: usize,
    weigher: W,
    metrics: Arc<CacheMetrics>,
}

impl<W> ByteBudget<W> {
    pub fn new(capacity_bytes: usize, weigher: W) -> Self {
        Self::with_metrics(capacity_bytes, weigher, Arc::new(CacheMetrics::new()))
    }

    /// Creates a budget that also reports removals into `metrics`.
    pub fn with_metrics(capacity_bytes: usize, weigher: W, metrics: Arc<CacheMetrics>) -> Self {
        Self {
            capacity_bytes,
            used_bytes: 0,
            weigher,
            metrics,
        }
    }

    /// Returns the configured byte capacity.
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Returns the summed weight of resident values.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn weigher(&self) -> &W {
        &self.weigher
    }
}

impl<W> std::fmt::Debug for ByteBudget<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBudget")
            .field("capacity_bytes", &self.capacity_bytes)
            .field("used_bytes", &self.used_bytes)
            .finish_non_exhaustive()
    }
}

impl<K, V, W> EvictionPolicy<K, Arc<V>> for ByteBudget<W>
where
    W: Weigher<V>,
{
    #[inline]
    fn is_over_budget(&self, _len: usize) -> bool {
        self.used_bytes > self.capacity_bytes
    }

    fn on_inserted(&mut self, _key: &K, value: &Arc<V>) {
        self.used_bytes = self
            .used_bytes
            .saturating_add(self.weigher.weigh(value.as_ref()));
    }

    fn on_removed(&mut self, _key: &K, value: &Arc<V>, cause: RemovalCause) {
        self.used_bytes = self
            .used_bytes
            .saturating_sub(self.weigher.weigh(value.as_ref()));
        self.metrics.record_removal(cause);
    }

    fn on_cleared(&mut self) {
        self.used_bytes = 0;
    }
}
