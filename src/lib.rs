//! freqcache: frequency-ordered caches with pluggable eviction budgets.
//!
//! [`FrequencyCache`](cache::frequency::FrequencyCache) is the single-threaded
//! LFU engine (LRU among equal frequencies, sliding expiration).
//! [`ByteBudgetCache`](cache::byte_budget::ByteBudgetCache) shares it across
//! threads under a byte budget, and [`FileCache`](cache::file::FileCache)
//! applies that to file contents.

pub mod cache;
pub mod clock;
pub mod config;
pub mod ds;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod traits;
