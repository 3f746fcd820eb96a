pub mod frequency_buckets;

pub use frequency_buckets::{BucketIter, DEFAULT_BUCKET_PREALLOC, FrequencyBuckets};
