use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::thumbnail::Thumbnail;

/// Bounded in-memory tier, evicting by entry count.
pub struct MemoryTier {
    cache: Mutex<LruCache<u64, Thumbnail>>,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    // A panic while holding the lock cannot leave the LRU half-updated.
    fn lock(&self) -> MutexGuard<'_, LruCache<u64, Thumbnail>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the entry and marks it most recently used.
    pub fn get(&self, id: u64) -> Option<Thumbnail> {
        self.lock().get(&id).cloned()
    }

    /// Presence check that leaves the eviction order alone.
    pub fn contains(&self, id: u64) -> bool {
        self.lock().contains(&id)
    }

    pub fn put(&self, id: u64, thumbnail: Thumbnail) {
        self.lock().put(id, thumbnail);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
