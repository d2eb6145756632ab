//! Host resolution cache.
//!
//! This module memoizes host name classifications with:
//! - Exact LRU eviction bounded by a fixed capacity
//! - Wildcard domain walk against the rule store on miss
//! - Hit/miss accounting with a periodic health log line
//!
//! Only positive results are cached. A host that no rule matches is looked
//! up against the rule store again on every call, so newly added rules take
//! effect without invalidation.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::store::RuleStore;
use crate::{HostEntry, Result};

/// Default cache capacity (number of entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 4 * 1024;

/// Default number of classify calls between two health log lines.
pub const DEFAULT_STATS_INTERVAL: u64 = 1000;

/// Configuration for the host cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub capacity: usize,
    /// Number of classify calls between two miss ratio log lines (0 disables them).
    pub stats_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            stats_interval: DEFAULT_STATS_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with the specified cache capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Set the stats interval.
    pub fn stats_interval(mut self, interval: u64) -> Self {
        self.stats_interval = interval;
        self
    }
}

/// Resolve a host against the rule store, bypassing any cache.
///
/// Tries the exact host first, then walks up the domain hierarchy trying
/// wildcard keys: `a.b.c` is checked against `a.b.c`, `*.a.b.c`, `*.b.c`
/// and `*.c`, in that order. Returns the first match.
pub fn resolve(store: &dyn RuleStore, host: &str) -> Result<Option<HostEntry>> {
    if host.is_empty() {
        return Ok(None);
    }

    if let Some(classification) = store.lookup_exact(host)? {
        return Ok(Some(HostEntry::new(host, classification)));
    }

    for wildcard in wildcard_keys(host) {
        if let Some(classification) = store.lookup_exact(&wildcard)? {
            return Ok(Some(HostEntry::new(wildcard, classification)));
        }
    }

    Ok(None)
}

/// Wildcard rule keys that may apply to `host`, most specific first.
pub fn wildcard_keys(host: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(0)
        .chain(host.match_indices('.').map(|(pos, _)| pos + 1))
        .filter(move |&start| start < host.len())
        .map(move |start| format!("*.{}", &host[start..]))
}

/// Host resolution cache backed by a rule store.
///
/// # Example
///
/// ```
/// use hostshield::{CacheConfig, Classification, HostCache, MemoryRuleStore};
/// use std::sync::Arc;
///
/// let store = MemoryRuleStore::new();
/// store.add_rule("*.tracker.net", Classification::Blocked).unwrap();
///
/// let cache = HostCache::new(Arc::new(store), CacheConfig::default());
/// let entry = cache.classify("a.tracker.net").unwrap();
/// assert_eq!(entry.classification, Classification::Blocked);
/// assert!(cache.classify("safe.com").is_none());
/// ```
pub struct HostCache {
    /// Cached entries keyed by the queried host name.
    entries: Mutex<LruCache<String, HostEntry>>,
    /// Backing rule store consulted on miss.
    store: Arc<dyn RuleStore>,
    /// Configuration.
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    requests: AtomicU64,
}

impl HostCache {
    /// Create a cache over `store`.
    pub fn new(store: Arc<dyn RuleStore>, config: CacheConfig) -> Self {
        // A zero capacity still keeps a single entry
        let capacity = NonZeroUsize::new(config.capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            store,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            requests: AtomicU64::new(0),
        }
    }

    /// Classify a host name.
    ///
    /// Returns `None` when no rule matches. A rule store failure is logged
    /// and also yields `None`; it is never propagated to the caller.
    pub fn classify(&self, host: &str) -> Option<HostEntry> {
        self.record_request();

        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(host) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // Fallback runs under the lock so a missed key is resolved once
        let resolved = match resolve(self.store.as_ref(), host) {
            Ok(resolved) => resolved,
            Err(e) => {
                log::warn!("Failed to resolve host {}: {}", host, e);
                None
            }
        };

        if let Some(ref entry) = resolved {
            entries.put(host.to_string(), entry.clone());
        }
        resolved
    }

    /// Get a cached entry without falling back to the rule store.
    ///
    /// Marks the entry as recently used but does not touch the counters.
    pub fn try_get(&self, host: &str) -> Option<HostEntry> {
        self.entries.lock().get(host).cloned()
    }

    /// Check whether a host is cached without changing its recency.
    pub fn contains(&self, host: &str) -> bool {
        self.entries.lock().contains(host)
    }

    /// Evict a single host.
    ///
    /// Host names are case-insensitive, so every cached spelling of `host`
    /// is evicted. Wildcard ancestors cached under other keys are left
    /// untouched.
    pub fn invalidate(&self, host: &str) -> Option<HostEntry> {
        let mut entries = self.entries.lock();
        let mut evicted = entries.pop(host);

        let wanted = host.to_lowercase();
        let variants: Vec<String> = entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.to_lowercase() == wanted)
            .cloned()
            .collect();
        for key in variants {
            let entry = entries.pop(&key);
            if evicted.is_none() {
                evicted = entry;
            }
        }
        evicted
    }

    /// Evict every entry.
    pub fn evict_all(&self) {
        self.entries.lock().clear();
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let (capacity, len) = {
            let entries = self.entries.lock();
            (entries.cap().get(), entries.len())
        };
        CacheStats {
            capacity,
            len,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Count a classify call. Returns true when the health line was logged.
    fn record_request(&self) -> bool {
        let interval = self.config.stats_interval;
        let count = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        if interval == 0 || count % interval != 0 {
            return false;
        }

        let stats = self.stats();
        log::debug!(
            "Host cache miss rate: {:.2}% ({} hits, {} misses, {}/{} entries)",
            stats.miss_ratio() * 100.0,
            stats.hits,
            stats.misses,
            stats.len,
            stats.capacity
        );
        true
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Maximum cache capacity.
    pub capacity: usize,
    /// Current number of entries in the cache.
    pub len: usize,
    /// Cumulative hit count.
    pub hits: u64,
    /// Cumulative miss count.
    pub misses: u64,
}

impl CacheStats {
    /// Total number of lookups.
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that missed, in `[0, 1]`.
    pub fn miss_ratio(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            total => self.misses as f64 / total as f64,
        }
    }

    /// Fraction of lookups that hit, in `[0, 1]`.
    pub fn hit_ratio(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}
