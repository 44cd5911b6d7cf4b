//! Bounded in-memory FIFO cache.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Default number of decoded buffers kept in memory.
pub const DEFAULT_HOT_CAPACITY: usize = 50;

/// In-memory cache evicting strictly by insertion order.
///
/// Reads do not refresh an entry, and re-inserting an existing key replaces
/// its value without moving it to the back of the queue.
#[derive(Debug)]
pub struct HotCache<K, V> {
    capacity: usize,
    order: VecDeque<K>,
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash + Clone, V: Clone> HotCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for HotCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_HOT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_in_insertion_order() {
        let mut cache = HotCache::new(3);
        for i in 0..5 {
            cache.insert(i, i * 10);
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&0).is_none());
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.get(&4), Some(40));
    }

    #[test]
    fn test_reads_do_not_refresh() {
        let mut cache = HotCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));

        cache.insert("c", 3);
        assert!(cache.get(&"a").is_none(), "oldest insert goes first even if read");
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut cache = HotCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 9);
        cache.insert("c", 3);

        assert!(cache.get(&"a").is_none());
        assert_eq!(cache.get(&"b"), Some(2));
    }

    #[test]
    fn test_default_capacity_is_fifty() {
        let mut cache: HotCache<usize, usize> = HotCache::default();
        for i in 0..60 {
            cache.insert(i, i);
        }
        assert_eq!(cache.len(), DEFAULT_HOT_CAPACITY);
        assert!(cache.get(&9).is_none());
        assert!(cache.get(&10).is_some());
    }
}
