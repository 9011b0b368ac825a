//! Storage implementations for suppression state.
//!
//! Provides concurrent, sharded storage for last-allowed timestamps.

use crate::application::ports::Storage;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;

/// Thread-safe sharded storage backed by DashMap.
///
/// Each shard is guarded by its own lock. An entry lookup holds the shard
/// lock until the decision is written, so decisions for one key are totally
/// ordered while different keys rarely contend.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Insert or update a value.
    pub fn insert(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Remove a key and return its value.
    pub fn remove(&self, key: &K) -> Option<(K, V)> {
        self.map.remove(key)
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn record_if<F>(&self, key: K, decide: F) -> bool
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        match self.map.entry(key) {
            Entry::Occupied(mut occupied) => match decide(Some(occupied.get())) {
                Some(value) => {
                    occupied.insert(value);
                    true
                }
                None => false,
            },
            Entry::Vacant(vacant) => match decide(None) {
                Some(value) => {
                    vacant.insert(value);
                    true
                }
                None => false,
            },
        }
    }

    fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.get(key).map(|value| value.value().clone())
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&self) {
        self.map.clear()
    }
}

// Implement Storage for Arc<ShardedStorage> to allow it to be used directly
impl<K, V> Storage<K, V> for std::sync::Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn record_if<F>(&self, key: K, decide: F) -> bool
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        (**self).record_if(key, decide)
    }

    fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        (**self).get(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn clear(&self) {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_if_creates_only_when_decided() {
        let storage: ShardedStorage<u64, u32> = ShardedStorage::new();

        assert!(!storage.record_if(1, |_| None));
        assert!(storage.is_empty());

        assert!(storage.record_if(1, |current| {
            assert!(current.is_none());
            Some(10)
        }));
        assert_eq!(storage.get(&1), Some(10));
    }

    #[test]
    fn test_record_if_sees_current_value() {
        let storage: ShardedStorage<u64, u32> = ShardedStorage::new();
        storage.insert(7, 1);

        assert!(storage.record_if(7, |current| current.map(|v| v + 1)));
        assert_eq!(storage.get(&7), Some(2));

        assert!(!storage.record_if(7, |_| None));
        assert_eq!(storage.get(&7), Some(2));
    }

    #[test]
    fn test_remove_and_clear() {
        let storage = ShardedStorage::new();
        storage.insert("a", 1);
        storage.insert("b", 2);
        assert!(storage.contains_key(&"a"));

        assert_eq!(storage.remove(&"a"), Some(("a", 1)));
        assert!(!storage.contains_key(&"a"));

        Storage::clear(&storage);
        assert_eq!(Storage::len(&storage), 0);
    }

    #[test]
    fn test_concurrent_record_if_is_serialized() {
        use std::sync::Arc;
        use std::thread;

        let storage: Arc<ShardedStorage<u64, u64>> = Arc::new(ShardedStorage::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let storage_clone = Arc::clone(&storage);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    storage_clone.record_if(0, |current| Some(current.copied().unwrap_or(0) + 1));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(storage.get(&0), Some(8000));
    }
}
