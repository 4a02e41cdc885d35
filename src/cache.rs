use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CachedPage {
    body: String,
    stored_at: Instant,
}

/// Upper bound on live entries when none is given.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Rendered pages kept for a fixed time, keyed by client and page.
pub struct PageCache {
    pages: DashMap<String, CachedPage>,
    ttl: Duration,
    capacity: usize,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            pages: DashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Returns a copy of a live entry. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<String> {
        let expired = match self.pages.get(key) {
            Some(page) if page.stored_at.elapsed() < self.ttl => return Some(page.body.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.pages.remove(key);
        }
        None
    }

    /// Stores a page. Expired entries are dropped first; a full cache refuses new keys.
    pub fn insert(&self, key: String, body: String) {
        if self.ttl.is_zero() {
            return;
        }
        let ttl = self.ttl;
        self.pages.retain(|_, page| page.stored_at.elapsed() < ttl);
        if self.pages.len() >= self.capacity && !self.pages.contains_key(&key) {
            log::debug!("PageCache::insert: full, not storing {}", key);
            return;
        }
        self.pages.insert(
            key,
            CachedPage {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
