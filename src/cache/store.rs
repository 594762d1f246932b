//! In-memory raster cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;

use crate::model::Size;

/// One cached rasterization.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub image: Arc<RgbaImage>,
    pub size: Size,
    pub key: String,
    pub created_at: DateTime<Utc>,
    /// Insertion order; higher is newer.
    pub sequence: u64,
    pub dirty: bool,
}

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
}

/// Key-to-image map with whole-cache invalidation.
///
/// At most one entry exists per key. Entries are only ever served while
/// clean and only for the size they were stored with; anything else reads
/// as a miss.
#[derive(Debug)]
pub struct RasterCache {
    entries: HashMap<String, CacheEntry>,
    enabled: bool,
    max_entries: Option<usize>,
    next_sequence: u64,
    stats: CacheStats,
}

impl RasterCache {
    pub fn new(enabled: bool, max_entries: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            enabled,
            max_entries,
            next_sequence: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable caching. Disabling drops every entry.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    /// Look up a clean entry stored for exactly `size`.
    pub fn lookup(&mut self, key: &str, size: Size) -> Option<Arc<RgbaImage>> {
        if !self.enabled {
            return None;
        }
        match self.entries.get(key) {
            Some(entry) if !entry.dirty && entry.size == size => {
                self.stats.hits += 1;
                log::debug!("Cache hit: {}", key);
                Some(Arc::clone(&entry.image))
            }
            Some(_) => {
                self.stats.misses += 1;
                log::debug!("Cache entry unusable, treating as miss: {}", key);
                None
            }
            None => {
                self.stats.misses += 1;
                log::debug!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Store an image under `key`, replacing any previous entry.
    ///
    /// When the cache is full the oldest entry is evicted first.
    pub fn store(&mut self, key: String, size: Size, image: Arc<RgbaImage>) {
        if !self.enabled {
            return;
        }
        if let Some(max) = self.max_entries {
            if max == 0 {
                return;
            }
            while !self.entries.contains_key(&key) && self.entries.len() >= max {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        let entry = CacheEntry {
            image,
            size,
            key: key.clone(),
            created_at: Utc::now(),
            sequence: self.next_sequence,
            dirty: false,
        };
        self.next_sequence += 1;
        self.entries.insert(key, entry);
        self.stats.stores += 1;
    }

    fn evict_oldest(&mut self) -> bool {
        let oldest = self
            .entries
            .values()
            .min_by_key(|e| e.sequence)
            .map(|e| e.key.clone());
        match oldest {
            Some(key) => {
                log::debug!("Evicting cache entry: {}", key);
                self.entries.remove(&key);
                self.stats.evictions += 1;
                true
            }
            None => false,
        }
    }

    /// Mark every entry dirty without freeing it.
    pub fn invalidate(&mut self) {
        for entry in self.entries.values_mut() {
            entry.dirty = true;
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("Clearing {} cache entries", self.entries.len());
        }
        self.entries.clear();
    }

    /// Number of stored entries (clean or dirty).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new(true, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(side: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(side, side))
    }

    #[test]
    fn test_store_then_hit() {
        let mut cache = RasterCache::default();
        assert!(cache.lookup("k", Size::square(4)).is_none());

        cache.store("k".into(), Size::square(4), image(4));
        let hit = cache.lookup("k", Size::square(4)).unwrap();
        assert_eq!(hit.dimensions(), (4, 4));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.stores, stats.entries), (1, 1, 1, 1));
    }

    #[test]
    fn test_size_mismatch_is_miss() {
        let mut cache = RasterCache::default();
        cache.store("k".into(), Size::square(4), image(4));
        assert!(cache.lookup("k", Size::square(8)).is_none());
    }

    #[test]
    fn test_dirty_entries_are_misses() {
        let mut cache = RasterCache::default();
        cache.store("k".into(), Size::square(4), image(4));
        cache.invalidate();
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup("k", Size::square(4)).is_none());

        cache.store("k".into(), Size::square(4), image(4));
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup("k", Size::square(4)).is_some());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let mut cache = RasterCache::default();
        cache.store("a".into(), Size::square(4), image(4));
        cache.set_enabled(false);
        assert!(cache.is_empty());

        cache.store("b".into(), Size::square(4), image(4));
        assert!(cache.is_empty());
        assert!(cache.lookup("b", Size::square(4)).is_none());
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_bounded_cache_evicts_oldest() {
        let mut cache = RasterCache::new(true, Some(2));
        cache.store("a".into(), Size::square(1), image(1));
        cache.store("b".into(), Size::square(1), image(1));
        cache.store("c".into(), Size::square(1), image(1));

        assert_eq!(cache.len(), 2);
        assert!(cache.entry("a").is_none());
        assert!(cache.entry("b").is_some());
        assert!(cache.entry("c").is_some());
        assert_eq!(cache.stats().evictions, 1);

        // Replacing an existing key never evicts.
        cache.store("c".into(), Size::square(1), image(1));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_follows_insertion_order() {
        let mut cache = RasterCache::new(true, Some(3));
        for key in ["k0", "k1", "k2"] {
            cache.store(key.into(), Size::square(1), image(1));
        }
        // Re-storing k0 makes it the newest entry.
        cache.store("k0".into(), Size::square(1), image(1));

        for (i, key) in ["k3", "k4", "k5"].into_iter().enumerate() {
            cache.store(key.into(), Size::square(1), image(1));
            assert_eq!(cache.stats().evictions, i as u64 + 1);
        }

        assert!(cache.entry("k1").is_none());
        assert!(cache.entry("k2").is_none());
        assert!(cache.entry("k0").is_none());
        assert!(cache.entry("k5").is_some());
        assert!(cache.entry("k4").unwrap().sequence < cache.entry("k5").unwrap().sequence);
    }
}
