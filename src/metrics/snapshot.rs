/// Point-in-time copy of [`CacheMetrics`](crate::metrics::CacheMetrics).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,

    pub inserts: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub removes: u64,
    pub replacements: u64,

    pub loads: u64,
    pub load_failures: u64,
    pub oversize_bypasses: u64, // loaded but too large to admit
    pub load_races: u64,        // loaded but another caller cached the key first
}

impl CacheMetricsSnapshot {
    /// Total `get`/`get_or_load` lookups.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups served from the cache, `0.0` with no lookups.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}
