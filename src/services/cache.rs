// src/services/cache.rs
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Explicit fetch cache keyed by ticker / series id. Entries older than the
/// TTL are refetched; failed fetches are never stored.
#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache::with_clock(ttl, SystemClock)
    }
}

impl<K: Eq + Hash, V: Clone, C: Clock> TtlCache<K, V, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        TtlCache {
            ttl,
            clock,
            entries: HashMap::new(),
        }
    }

    /// Oldest fetch time still considered fresh. `None` when the TTL reaches
    /// past the earliest representable instant, i.e. nothing expires.
    fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.clock.now().checked_sub_signed(self.ttl)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        match self.cutoff() {
            Some(cutoff) if entry.fetched_at < cutoff => None,
            _ => Some(entry.value.clone()),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.evict_expired();
        let fetched_at = self.clock.now();
        self.entries.insert(key, CacheEntry { value, fetched_at });
    }

    /// Drop every entry older than the TTL.
    pub fn evict_expired(&mut self) {
        if let Some(cutoff) = self.cutoff() {
            self.entries.retain(|_, entry| entry.fetched_at >= cutoff);
        }
    }

    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
