pub use crate::cache::byte_budget::ByteBudgetCache;
pub use crate::cache::file::FileCache;
pub use crate::cache::frequency::{CacheEntry, FrequencyCache};
pub use crate::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::config::ByteBudgetConfig;
pub use crate::error::{InvariantError, LoadError};
pub use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use crate::policy::{ByteBudget, ByteLen, EntryCountPolicy, Weigher};
pub use crate::traits::{EvictionPolicy, RemovalCause};
