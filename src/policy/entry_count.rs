use crate::traits::EvictionPolicy;

/// Bounds the number of resident entries.
///
/// Over budget once more than `capacity` entries are resident, so an
/// insertion into a full cache evicts exactly one entry. A capacity of 0
/// admits nothing: every insertion is evicted immediately.
///
/// ```
/// use freqcache::cache::frequency::FrequencyCache;
///
/// let mut cache = FrequencyCache::new(2);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.get(&"a");
/// cache.put("c", 3); // "b" has the lowest frequency
///
/// assert!(cache.contains(&"a"));
/// assert!(!cache.contains(&"b"));
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCountPolicy {
    capacity: usize,
}

impl EntryCountPolicy {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K, V> EvictionPolicy<K, V> for EntryCountPolicy {
    #[inline]
    fn is_over_budget(&self, len: usize) -> bool {
        len > self.capacity
    }
}
