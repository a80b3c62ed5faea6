//! Query Cache
//!
//! Bounded LRU of decoded field values keyed by `(address, language id)`.
//! Entries are spread over independently locked shards picked by key hash, so
//! concurrent lookups on different keys rarely wait on each other. A capacity
//! of 0 disables the cache entirely.

use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;
use std::hash::BuildHasher;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of cached lookups
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Upper bound on shard count
const MAX_SHARDS: usize = 16;

/// Decoded values of one (address, language) lookup
pub type CachedValues = Arc<[String]>;

/// Cache key: the parsed address plus the dense language id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Queried address
    pub addr: IpAddr,
    /// Language id from the snapshot's language table
    pub language: u16,
}

type Shard = Mutex<LruCache<CacheKey, CachedValues, FxBuildHasher>>;

/// Sharded LRU cache owned by one snapshot
pub struct QueryCache {
    shards: Box<[Shard]>,
    hasher: FxBuildHasher,
    capacity: usize,
}

impl QueryCache {
    /// Create a cache holding at most (roughly) `capacity` entries
    ///
    /// Capacity is split evenly across shards, rounding up.
    pub fn new(capacity: usize) -> Self {
        let shard_count = capacity.min(MAX_SHARDS);
        let shards = match NonZeroUsize::new(capacity.div_ceil(shard_count.max(1))) {
            Some(per_shard) => (0..shard_count)
                .map(|_| Mutex::new(LruCache::with_hasher(per_shard, FxBuildHasher)))
                .collect(),
            None => Vec::new().into_boxed_slice(),
        };

        Self {
            shards,
            hasher: FxBuildHasher,
            capacity,
        }
    }

    /// True unless created with capacity 0
    pub fn is_enabled(&self) -> bool {
        !self.shards.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn shard(&self, key: &CacheKey) -> Option<&Shard> {
        if self.shards.is_empty() {
            return None;
        }
        let index = self.hasher.hash_one(key) as usize % self.shards.len();
        self.shards.get(index)
    }

    /// Look up a key, marking it most recently used
    pub fn get(&self, key: &CacheKey) -> Option<CachedValues> {
        self.shard(key)?.lock().get(key).cloned()
    }

    /// Insert a lookup result, evicting the shard's least recently used entry if full
    pub fn insert(&self, key: CacheKey, values: CachedValues) {
        if let Some(shard) = self.shard(&key) {
            shard.lock().put(key, values);
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().clear();
        }
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("capacity", &self.capacity)
            .field("shards", &self.shards.len())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key(last: u8, language: u16) -> CacheKey {
        CacheKey {
            addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)),
            language,
        }
    }

    fn values(v: &str) -> CachedValues {
        vec![v.to_string()].into()
    }

    #[test]
    fn test_insert_and_get() {
        let cache = QueryCache::new(100);
        assert!(cache.get(&key(1, 0)).is_none());

        cache.insert(key(1, 0), values("a"));
        assert_eq!(&*cache.get(&key(1, 0)).unwrap(), &["a".to_string()]);
        // Same address, other language is a different entry
        assert!(cache.get(&key(1, 1)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = QueryCache::new(32);
        for i in 0..=255u8 {
            cache.insert(key(i, 0), values("x"));
        }
        // 16 shards x 2 entries
        assert!(cache.len() <= 32);
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_single_entry_cache_evicts_lru() {
        let cache = QueryCache::new(1);
        cache.insert(key(1, 0), values("a"));
        cache.insert(key(2, 0), values("b"));

        assert!(cache.get(&key(1, 0)).is_none());
        assert!(cache.get(&key(2, 0)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = QueryCache::new(0);
        assert!(!cache.is_enabled());
        cache.insert(key(1, 0), values("a"));
        assert!(cache.get(&key(1, 0)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::new(10);
        cache.insert(key(1, 0), values("a"));
        cache.insert(key(2, 3), values("b"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
