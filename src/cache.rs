//! Memoized parse results keyed by the raw specification string.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use crate::errors::ParseError;
use crate::query::Query;

/// Inserts between two sweeps of expired entries.
pub const PURGE_INTERVAL: usize = 256;

/// Outcome of one parse, as stored.
pub type ParseResult = Result<Query, ParseError>;

/// Keyed TTL store behind the query cache.
pub trait QueryStore: Send + Sync {
    fn get(&self, spec: &str) -> Option<ParseResult>;
    fn set(&self, spec: &str, result: ParseResult, ttl: Duration);
}

struct CacheEntry {
    result: ParseResult,
    expires_at: Instant,
}

/// In-process store. Expired entries are dropped when next looked up, and
/// all of them are swept every [`PURGE_INTERVAL`] inserts.
#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    inserts: AtomicUsize,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry count, including expired entries not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        purge(&mut self.entries.lock())
    }
}

fn purge(entries: &mut HashMap<String, CacheEntry>) -> usize {
    let now = Instant::now();
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before - entries.len()
}

impl QueryStore for QueryCache {
    fn get(&self, spec: &str) -> Option<ParseResult> {
        let mut entries = self.entries.lock();
        let entry = entries.get(spec)?;
        if entry.expires_at > Instant::now() {
            trace!(spec, "query cache hit");
            return Some(entry.result.clone());
        }
        entries.remove(spec);
        trace!(spec, "query cache entry expired");
        None
    }

    fn set(&self, spec: &str, result: ParseResult, ttl: Duration) {
        let entry = CacheEntry {
            result,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.lock();
        entries.insert(spec.to_string(), entry);
        if (self.inserts.fetch_add(1, Ordering::Relaxed) + 1) % PURGE_INTERVAL == 0 {
            let removed = purge(&mut entries);
            trace!(removed, remaining = entries.len(), "query cache swept");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn hit_returns_stored_result() {
        let cache = QueryCache::new();
        cache.set("a.b", parse("a.b"), Duration::from_secs(60));
        let hit = cache.get("a.b").unwrap().unwrap();
        assert_eq!(hit.spec(), "a.b");
        assert!(cache.get("a.c").is_none());
    }

    #[test]
    fn errors_are_cached_too() {
        let cache = QueryCache::new();
        cache.set("", parse(""), Duration::from_secs(60));
        assert_eq!(cache.get(""), Some(Err(ParseError::Empty)));
    }

    #[test]
    fn inserts_sweep_expired_entries() {
        let cache = QueryCache::new();
        cache.set("kept", parse("kept"), Duration::from_secs(60));
        for i in 1..PURGE_INTERVAL {
            let spec = format!("k{i}");
            cache.set(&spec, parse(&spec), Duration::ZERO);
        }
        assert_eq!(cache.len(), 1);
        assert!(cache.get("kept").is_some());
    }

    #[test]
    fn expired_entries_are_evicted_on_access() {
        let cache = QueryCache::new();
        cache.set("a", parse("a"), Duration::ZERO);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_drops_only_expired() {
        let cache = QueryCache::new();
        cache.set("a", parse("a"), Duration::ZERO);
        cache.set("b", parse("b"), Duration::from_secs(60));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
