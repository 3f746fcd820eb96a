//! Frequency buckets for O(1) LFU tracking with LRU tie-breaking.
//!
//! Groups keys by access frequency. Each frequency owns a doubly-linked list
//! of keys ordered by recency: the head is the key touched longest ago, the
//! tail the key touched most recently. Buckets are themselves linked in
//! ascending frequency order and `min_freq` points at the lowest non-empty
//! one, so the eviction candidate is always the head of the `min_freq`
//! bucket.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      FrequencyBuckets<K> Layout                      │
//! │                                                                      │
//! │   index: FxHashMap<K, usize>        nodes: Vec<Option<Node<K>>>      │
//! │   ┌──────────┬───────┐              ┌──────┬──────────────────────┐  │
//! │   │ "a.css"  │   0   │─────────────►│  0   │ freq:2, prev/next    │  │
//! │   │ "b.js"   │   1   │─────────────►│  1   │ freq:1, prev/next    │  │
//! │   │ "c.png"  │   2   │─────────────►│  2   │ freq:1, prev/next    │  │
//! │   └──────────┴───────┘              └──────┴──────────────────────┘  │
//! │                                                                      │
//! │   buckets: FxHashMap<u64, Bucket>                                    │
//! │                                                                      │
//! │   min_freq = 1                                                       │
//! │      │                                                               │
//! │      ▼                                                               │
//! │   freq=1: head ──► [1] ◄──► [2] ◄── tail                             │
//! │                  oldest      newest                                  │
//! │                (evicted first)                                       │
//! │   freq=2: head ──► [0] ◄── tail                                      │
//! │                                                                      │
//! │   Bucket links: freq=1 ─higher─► freq=2 ─higher─► None               │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation  | Time | Notes                                         |
//! |------------|------|-----------------------------------------------|
//! | `insert`   | O(1) | New key joins the tail of bucket 1            |
//! | `touch`    | O(1) | Frequency + 1, key joins the new bucket tail  |
//! | `reset`    | O(1) | Frequency back to 1, key joins bucket 1 tail  |
//! | `remove`   | O(1) | Drop key, prune its bucket if it empties      |
//! | `pop_min`  | O(1) | Head of the `min_freq` bucket                 |
//! | `peek_min` | O(1) | Same candidate, without removal               |
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::ds::FrequencyBuckets;
//!
//! let mut freq = FrequencyBuckets::new();
//! freq.insert("a");
//! freq.insert("b");
//! freq.insert("c");
//!
//! freq.touch(&"a"); // a: 2
//!
//! // Lowest frequency first, oldest first among ties.
//! assert_eq!(freq.pop_min(), Some(("b", 1)));
//! assert_eq!(freq.pop_min(), Some(("c", 1)));
//! assert_eq!(freq.pop_min(), Some(("a", 2)));
//! assert_eq!(freq.pop_min(), None);
//! ```
//!
//! ## Thread Safety
//!
//! Not thread-safe. Owners serialize access (see
//! [`ByteBudgetCache`](crate::cache::byte_budget::ByteBudgetCache)).

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

/// Bucket pre-allocation; most keys cluster at low frequencies.
pub const DEFAULT_BUCKET_PREALLOC: usize = 32;

#[derive(Debug)]
struct Node<K> {
    prev: Option<usize>,
    next: Option<usize>,
    freq: u64,
    key: K,
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    // Neighbouring non-empty frequencies, ascending.
    lower: Option<u64>,
    higher: Option<u64>,
}

/// O(1) LFU metadata tracker with least-recently-touched tie-breaking.
///
/// Tracks only keys and their frequencies; values live with the owner.
#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    index: FxHashMap<K, usize>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tracker with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::with_capacity_and_hasher(
                DEFAULT_BUCKET_PREALLOC,
                Default::default(),
            ),
            min_freq: 0,
        }
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is tracked.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the current frequency of `key`.
    #[inline]
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.node(id).map(|node| node.freq)
    }

    /// Returns the smallest frequency with a non-empty bucket.
    ///
    /// ```
    /// use freqcache::ds::FrequencyBuckets;
    ///
    /// let mut freq = FrequencyBuckets::new();
    /// assert_eq!(freq.min_freq(), None);
    ///
    /// freq.insert("a");
    /// freq.touch(&"a");
    /// assert_eq!(freq.min_freq(), Some(2));
    /// ```
    pub fn min_freq(&self) -> Option<u64> {
        if self.min_freq == 0 {
            None
        } else {
            Some(self.min_freq)
        }
    }

    /// Returns the next eviction candidate without removing it.
    pub fn peek_min(&self) -> Option<(&K, u64)> {
        let id = self.buckets.get(&self.min_freq)?.head?;
        self.node(id).map(|node| (&node.key, node.freq))
    }

    /// Iterates the keys of one bucket, oldest first.
    pub fn iter_bucket(&self, freq: u64) -> BucketIter<'_, K> {
        BucketIter {
            buckets: self,
            current: self.buckets.get(&freq).and_then(|bucket| bucket.head),
        }
    }

    /// Starts tracking `key` at frequency 1.
    ///
    /// Returns `false` (and changes nothing) if the key is already tracked.
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let node = Node {
            prev: None,
            next: None,
            freq: 1,
            key: key.clone(),
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            },
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            },
        };
        self.index.insert(key, id);
        self.attach(id, 1, None);
        true
    }

    /// Increments the frequency of `key` and returns the new value.
    ///
    /// The key moves to the tail (most recent end) of its new bucket. At
    /// `u64::MAX` the frequency saturates and only recency is refreshed.
    ///
    /// ```
    /// use freqcache::ds::FrequencyBuckets;
    ///
    /// let mut freq = FrequencyBuckets::new();
    /// freq.insert("page");
    /// assert_eq!(freq.touch(&"page"), Some(2));
    /// assert_eq!(freq.touch(&"missing"), None);
    /// ```
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let freq = self.node(id)?.freq;
        let next = freq.saturating_add(1);

        let (bucket_gone, lower) = self.detach(id)?;
        let after = if bucket_gone { lower } else { Some(freq) };
        self.attach(id, next, after);
        Some(next)
    }

    /// Resets the frequency of `key` to 1 and makes it the most recent key
    /// of bucket 1. Returns the frequency it had before.
    pub fn reset(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let previous = self.node(id)?.freq;
        self.detach(id)?;
        self.attach(id, 1, None);
        Some(previous)
    }

    /// Stops tracking `key` and returns its last frequency.
    pub fn remove(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.detach(id)?;
        self.index.remove(key);
        let node = self.release(id)?;
        Some(node.freq)
    }

    /// Removes and returns the eviction candidate `(key, freq)`: the head of
    /// the lowest-frequency bucket.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        let id = self.buckets.get(&self.min_freq)?.head?;
        self.detach(id)?;
        let node = self.release(id)?;
        self.index.remove(&node.key);
        Some((node.key, node.freq))
    }

    /// Drops every key.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    /// Verifies index, node, and bucket-chain agreement.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.is_empty() {
            if !self.buckets.is_empty() || self.min_freq != 0 {
                return Err(InvariantError::new(
                    "empty tracker still holds buckets or a min_freq",
                ));
            }
            return Ok(());
        }

        let lowest = self.buckets.keys().copied().min().unwrap_or(0);
        if lowest != self.min_freq {
            return Err(InvariantError::new(format!(
                "min_freq is {} but the lowest bucket is {}",
                self.min_freq, lowest
            )));
        }

        let mut seen = 0usize;
        for (&freq, bucket) in &self.buckets {
            if bucket.len == 0 {
                return Err(InvariantError::new(format!("bucket {} is empty", freq)));
            }
            if let Some(lower) = bucket.lower
                && self.buckets.get(&lower).and_then(|b| b.higher) != Some(freq)
            {
                return Err(InvariantError::new(format!(
                    "bucket {} has a broken lower link",
                    freq
                )));
            }
            if let Some(higher) = bucket.higher
                && self.buckets.get(&higher).and_then(|b| b.lower) != Some(freq)
            {
                return Err(InvariantError::new(format!(
                    "bucket {} has a broken higher link",
                    freq
                )));
            }

            let mut count = 0usize;
            let mut last = None;
            let mut current = bucket.head;
            while let Some(id) = current {
                let node = self
                    .node(id)
                    .ok_or_else(|| InvariantError::new("bucket links a released node"))?;
                if node.freq != freq || node.prev != last {
                    return Err(InvariantError::new(format!(
                        "node in bucket {} disagrees with its links",
                        freq
                    )));
                }
                if self.index.get(&node.key) != Some(&id) {
                    return Err(InvariantError::new("index does not point at bucket node"));
                }
                last = Some(id);
                current = node.next;
                count += 1;
            }
            if bucket.tail != last || bucket.len != count {
                return Err(InvariantError::new(format!(
                    "bucket {} tail or length is stale",
                    freq
                )));
            }
            seen += count;
        }

        if seen != self.index.len() {
            return Err(InvariantError::new(format!(
                "{} keys indexed but {} linked in buckets",
                self.index.len(),
                seen
            )));
        }
        Ok(())
    }

    fn node(&self, id: usize) -> Option<&Node<K>> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: usize) -> Option<&mut Node<K>> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    fn release(&mut self, id: usize) -> Option<Node<K>> {
        let node = self.nodes.get_mut(id)?.take()?;
        self.free.push(id);
        Some(node)
    }

    /// Unlinks `id` from its bucket. Returns whether the bucket was dropped
    /// and the next lower non-empty frequency.
    fn detach(&mut self, id: usize) -> Option<(bool, Option<u64>)> {
        let (freq, prev, next) = {
            let node = self.node(id)?;
            (node.freq, node.prev, node.next)
        };

        match prev {
            Some(prev) => self.node_mut(prev)?.next = next,
            None => self.buckets.get_mut(&freq)?.head = next,
        }
        match next {
            Some(next) => self.node_mut(next)?.prev = prev,
            None => self.buckets.get_mut(&freq)?.tail = prev,
        }
        let node = self.node_mut(id)?;
        node.prev = None;
        node.next = None;

        let bucket = self.buckets.get_mut(&freq)?;
        bucket.len -= 1;
        let (lower, higher) = (bucket.lower, bucket.higher);
        if bucket.len > 0 {
            return Some((false, lower));
        }

        self.buckets.remove(&freq);
        if let Some(lower) = lower
            && let Some(bucket) = self.buckets.get_mut(&lower)
        {
            bucket.higher = higher;
        }
        if let Some(higher) = higher
            && let Some(bucket) = self.buckets.get_mut(&higher)
        {
            bucket.lower = lower;
        }
        if self.min_freq == freq {
            self.min_freq = higher.unwrap_or(0);
        }
        Some((true, lower))
    }

    /// Appends `id` to the tail of bucket `freq`, creating the bucket right
    /// above `after` (or at the bottom when `after` is `None`) if needed.
    fn attach(&mut self, id: usize, freq: u64, after: Option<u64>) {
        if !self.buckets.contains_key(&freq) {
            let higher = match after {
                Some(lower) => self.buckets.get(&lower).and_then(|b| b.higher),
                None => self.min_freq(),
            };
            self.buckets.insert(
                freq,
                Bucket {
                    lower: after,
                    higher,
                    ..Bucket::default()
                },
            );
            if let Some(lower) = after
                && let Some(bucket) = self.buckets.get_mut(&lower)
            {
                bucket.higher = Some(freq);
            }
            if let Some(higher) = higher
                && let Some(bucket) = self.buckets.get_mut(&higher)
            {
                bucket.lower = Some(freq);
            }
            if after.is_none() {
                self.min_freq = freq;
            }
        }

        let old_tail = match self.buckets.get_mut(&freq) {
            Some(bucket) => {
                let old_tail = bucket.tail;
                bucket.tail = Some(id);
                if old_tail.is_none() {
                    bucket.head = Some(id);
                }
                bucket.len += 1;
                old_tail
            },
            None => return,
        };
        if let Some(tail) = old_tail
            && let Some(node) = self.node_mut(tail)
        {
            node.next = Some(id);
        }
        if let Some(node) = self.node_mut(id) {
            node.freq = freq;
            node.prev = old_tail;
            node.next = None;
        }
    }
}

impl<K> Default for FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the keys of one frequency bucket, oldest first.
pub struct BucketIter<'a, K> {
    buckets: &'a FrequencyBuckets<K>,
    current: Option<usize>,
}

impl<'a, K> Iterator for BucketIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.buckets.nodes.get(id)?.as_ref()?;
        self.current = node.next;
        Some(&node.key)
    }
}
