use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Process-local keyed cache holding at most `capacity` entries; the least recently
/// used entry makes room for a new one. Entries vanish on restart.
#[derive(Clone, Debug)]
pub struct MemoryCache<T: Clone> {
    cache: Arc<DashMap<String, (u64, T)>>,
    clock: Arc<AtomicU64>,
    capacity: usize,
}

impl<T: Clone> MemoryCache<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cache: Arc::new(DashMap::with_capacity(capacity)),
            clock: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let stamp = self.tick();
        self.cache.get_mut(key).map(|mut entry| {
            entry.0 = stamp;
            entry.1.clone()
        })
    }

    pub fn set(&self, key: &str, value: &T) {
        if !self.cache.contains_key(key) {
            self.evict_to(self.capacity - 1);
        }
        self.cache.insert(key.to_string(), (self.tick(), value.clone()));
    }

    pub fn del(&self, key: &str) -> Option<T> {
        self.cache.remove(key).map(|(_, (_, value))| value)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    fn evict_to(&self, limit: usize) {
        while self.cache.len() > limit {
            let oldest = self
                .cache
                .iter()
                .min_by_key(|entry| entry.value().0)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    debug!("Evicting cached entry {}", key);
                    self.cache.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_del() {
        let cache = MemoryCache::<String>::new(4);
        assert!(cache.get("alice").is_none());

        cache.set("alice", &"ctx".to_string());
        assert_eq!(cache.get("alice").as_deref(), Some("ctx"));

        assert_eq!(cache.del("alice").as_deref(), Some("ctx"));
        assert!(cache.get("alice").is_none());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = MemoryCache::<u32>::new(2);
        cache.set("a", &1);
        cache.set("b", &2);
        assert_eq!(cache.get("a"), Some(1));

        cache.set("c", &3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));

        // overwriting an existing key never evicts
        cache.set("a", &10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_many_identities_stay_bounded() {
        let cache = MemoryCache::<usize>::new(8);
        for i in 0..100 {
            cache.set(&format!("id{}", i), &i);
        }
        assert_eq!(cache.len(), 8);
        assert_eq!(cache.get("id99"), Some(99));
        assert_eq!(cache.get("id0"), None);
    }
}
