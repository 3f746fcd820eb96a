//! Budget policies plugged into [`FrequencyCache`](crate::cache::frequency::FrequencyCache).

pub mod byte_budget;
pub mod entry_count;

pub use byte_budget::{ByteBudget, ByteLen, Weigher};
pub use entry_count::EntryCountPolicy;
