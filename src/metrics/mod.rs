//! Cache counters and point-in-time snapshots.
//!
//! Recording and reading are split the same way as everywhere else in the
//! crate: [`CacheMetrics`] only increments relaxed atomics and is shared
//! (`Arc`) between a cache and its policy; [`CacheMetricsSnapshot`] is a
//! plain copy for reporting and assertions.

pub mod counters;
pub mod snapshot;

pub use counters::CacheMetrics;
pub use snapshot::CacheMetricsSnapshot;
