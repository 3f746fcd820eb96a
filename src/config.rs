//! Configuration for byte-bounded caches.

use std::time::Duration;

/// Limits for a [`ByteBudgetCache`](crate::cache::byte_budget::ByteBudgetCache).
///
/// Every combination of values is usable. A zero `capacity_bytes` keeps
/// nothing but empty values: each non-empty insertion is evicted by the
/// insertion itself. A `max_entry_size` above `capacity_bytes` admits single
/// values larger than the whole budget, which then evict everything else.
///
/// ```
/// use std::time::Duration;
/// use freqcache::config::ByteBudgetConfig;
///
/// let config = ByteBudgetConfig::new(1 << 20)
///     .with_max_entry_size(64 * 1024)
///     .with_timeout(Duration::from_secs(300));
///
/// assert!(config.is_oversize(64 * 1024 + 1));
/// assert!(!config.is_oversize(64 * 1024));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteBudgetConfig {
    /// Upper bound on the summed weight of resident values.
    pub capacity_bytes: usize,
    /// Largest weight admitted into the cache; `0` admits any size.
    pub max_entry_size: usize,
    /// Sliding idle timeout; `Duration::ZERO` disables expiration.
    pub timeout: Duration,
}

impl ByteBudgetConfig {
    /// `capacity_bytes` with half of it as the per-entry ceiling and no
    /// expiration.
    ///
    /// For `capacity_bytes < 2` the halved ceiling is `0`, which means
    /// unlimited: no per-entry ceiling applies. Call
    /// [`with_max_entry_size`](Self::with_max_entry_size) to set one.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            max_entry_size: capacity_bytes / 2,
            timeout: Duration::ZERO,
        }
    }

    pub fn with_max_entry_size(mut self, max_entry_size: usize) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `true` when a value of `weight` bytes bypasses the cache.
    #[inline]
    pub fn is_oversize(&self, weight: usize) -> bool {
        self.max_entry_size != 0 && weight > self.max_entry_size
    }
}
