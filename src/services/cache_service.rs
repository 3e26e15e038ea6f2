use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::models::{NewsItem, StockSnapshot, TickerSymbol};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> CacheInner<K, V> {
    fn remove(&mut self, key: &K) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }
}

/// Size-bounded map whose entries expire a fixed time after insertion.
///
/// When a new key arrives and the cache is full, expired entries are dropped
/// first and then the oldest inserted key is evicted.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    name: &'static str,
    inner: Mutex<CacheInner<K, V>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration, capacity: usize) -> Self {
        Self {
            name,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                info!("[{}] Cache HIT: {}", self.name, key);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("[{}] Entry expired: {}", self.name, key);
            inner.remove(key);
        }
        None
    }

    pub fn set(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        // Overwrites move the key to the back of the insertion order.
        inner.remove(&key);

        if inner.entries.len() >= self.capacity {
            inner.purge_expired(now);
        }
        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else { break };
            inner.entries.remove(&oldest);
            debug!("[{}] Evicted oldest entry: {}", self.name, oldest);
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
        info!("[{}] Cached: {}", self.name, key);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn purge_expired(&self) -> usize {
        let removed = self.inner.lock().purge_expired(Instant::now());
        if removed > 0 {
            info!("[{}] Cleared {} expired cache entries", self.name, removed);
        }
        removed
    }

    /// Number of stored entries, including ones that expired but were not yet read.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The two caches shared by every analysis request.
#[derive(Debug)]
pub struct CacheLayer {
    pub metrics: TtlCache<TickerSymbol, StockSnapshot>,
    pub news: TtlCache<TickerSymbol, Vec<NewsItem>>,
}

impl CacheLayer {
    pub fn new(metrics_ttl: Duration, news_ttl: Duration, capacity: usize) -> Self {
        Self {
            metrics: TtlCache::new("StockCache", metrics_ttl, capacity),
            news: TtlCache::new("NewsCache", news_ttl, capacity),
        }
    }

    pub fn clear(&self) {
        self.metrics.clear();
        self.news.clear();
        info!("[CacheService] All caches cleared");
    }

    pub fn purge_expired(&self) -> usize {
        self.metrics.purge_expired() + self.news.purge_expired()
    }
}
