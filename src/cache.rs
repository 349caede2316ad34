//! Bounded in-memory cache with per-entry TTL and LRU eviction.
//!
//! Shared by the interpretation service and the live ticker. The cache is a
//! plain value; callers wrap it in whatever lock suits their access pattern.
//! Every time-dependent method has an `_at` variant taking an explicit
//! `Instant` so expiry can be tested without sleeping.

use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    /// Recency tick, bumped on every hit
    last_used: u64,
}

pub struct BoundedCache<K, V> {
    entries: FxHashMap<K, Entry<V>>,
    capacity: usize,
    ttl: Duration,
    tick: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    /// `capacity` is clamped to at least one entry
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity: capacity.max(1),
            ttl,
            tick: 0,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Fresh value for `key`; an expired entry is removed and reported as a miss.
    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => now.saturating_duration_since(entry.inserted_at) >= self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.value.clone()
        })
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// Insert or replace. At capacity, expired entries go first, then the
    /// least recently used one.
    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.sweep_expired_at(now);
            if self.entries.len() >= self.capacity {
                self.evict_lru();
            }
        }

        self.tick += 1;
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                last_used: self.tick,
            },
        );
    }

    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep_expired_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.inserted_at) < ttl);
        before - self.entries.len()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
