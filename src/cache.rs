// Item detail cache
// Keeps recently fetched catalog items so reopening a detail screen does not
// hit the backend again while the entry is fresh.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::CatalogItem;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_entries: 256,
        }
    }
}

#[derive(Debug, Default)]
struct CacheStats {
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
    eviction_count: AtomicUsize,
    expired_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub eviction_count: usize,
    pub expired_count: usize,
}

struct CacheEntry {
    item: CatalogItem,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

pub struct DetailCache {
    entries: DashMap<i64, CacheEntry>,
    config: CacheConfig,
    stats: CacheStats,
}

impl DetailCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            stats: CacheStats::default(),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_seconds)
    }

    pub fn get(&self, id: i64) -> Option<CatalogItem> {
        let lookup = self
            .entries
            .get(&id)
            .map(|entry| (entry.is_expired(self.ttl()), entry.item.clone()));

        match lookup {
            Some((false, item)) => {
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                Some(item)
            }
            Some((true, _)) => {
                self.remove_expired(id);
                self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                None
            }
            None => {
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                None
            }
        }
    }

    /// Stores a snapshot, replacing any previous one for the same id.
    /// Returns false when the cache is configured with no capacity.
    pub fn store(&self, item: CatalogItem) -> bool {
        if self.config.max_entries == 0 {
            return false;
        }
        if !self.entries.contains_key(&item.id) && self.entries.len() >= self.config.max_entries {
            self.remove_oldest_entry();
        }

        self.entries.insert(
            item.id,
            CacheEntry {
                item,
                stored_at: Instant::now(),
            },
        );
        true
    }

    // Leaves an entry alone if another thread refreshed it meanwhile
    fn remove_expired(&self, id: i64) -> bool {
        let ttl = self.ttl();
        self.entries
            .remove_if(&id, |_, entry| entry.is_expired(ttl))
            .is_some()
    }

    fn remove_oldest_entry(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| *entry.key());

        if let Some(id) = oldest {
            if self.entries.remove(&id).is_some() {
                self.stats.eviction_count.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    pub fn invalidate(&self, id: i64) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.entries.len(),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            eviction_count: self.stats.eviction_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
        }
    }
}
