//! Bounded FIFO result cache
//!
//! Stores prior analysis results keyed by `position_depth`. Entries are kept
//! in an explicit insertion-order queue next to the hash map, and eviction is
//! strictly first-in-first-out: reads never refresh an entry's position.
//!
//! Expiry is recorded per entry but only enforced by [`ResultCache::clean_expired`].
//! [`ResultCache::get`] hands back whatever is stored; callers decide whether
//! an expired entry may be served.

use super::types::{AnalysisResult, CacheStamp, CacheStats};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Build the cache key for a position analysed at `depth`
pub fn cache_key(position: &str, depth: u32) -> String {
    format!("{position}_{depth}")
}

/// Cached analysis with its lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub result: AnalysisResult,
    pub cache_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(result: AnalysisResult, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            result,
            cache_time: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// The stored result, stamped with this entry's cache times
    pub fn to_result(&self) -> AnalysisResult {
        let mut result = self.result.clone();
        result.cache = Some(CacheStamp {
            cache_time: self.cache_time,
            expires_at: self.expires_at,
        });
        result
    }
}

/// Insertion-ordered cache with a hard capacity
#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
    max_size: usize,
}

impl ResultCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_size,
        }
    }

    /// Insert `entry` under `key`
    ///
    /// A new key at capacity evicts the earliest-inserted key first. An
    /// existing key is replaced in place and keeps its queue position.
    pub fn put(&mut self, key: String, entry: CacheEntry) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        while self.entries.len() >= self.max_size {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            debug!("[CACHE] Evicted oldest entry {}", oldest);
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Remove entries whose `expires_at` is before `now`, returning how many went
    pub fn clean_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let entries = &self.entries;
        self.order.retain(|key| entries.contains_key(key));
        before - self.entries.len()
    }

    /// Size and expiry counts, without touching the entries
    pub fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            expired_count: self
                .entries
                .values()
                .filter(|entry| entry.is_expired(now))
                .count(),
        }
    }

    /// Keys from oldest to newest insertion
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
