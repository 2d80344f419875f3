//! In-memory caching layer for registry checks.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache entry with TTL.
#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    exists: bool,
    expires_at: Instant,
}

/// Thread-safe cache of registry existence verdicts.
///
/// Bulk mode sees the same popular packages across many manifests; caching
/// keeps verdicts idempotent within a run and saves registry calls. Nothing
/// survives process exit.
#[derive(Debug, Clone)]
pub struct RegistryCache {
    cache: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl RegistryCache {
    /// Create a new cache with the given TTL in seconds.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Get a cached verdict if it exists and hasn't expired.
    pub fn get(&self, package_name: &str) -> Option<bool> {
        let entry = self.cache.get(package_name)?;
        if Instant::now() < entry.expires_at {
            return Some(entry.exists);
        }
        // Entry expired, remove it
        drop(entry);
        self.cache.remove(package_name);
        None
    }

    /// Store a verdict in the cache.
    pub fn set(&self, package_name: &str, exists: bool) {
        let entry = CacheEntry {
            exists,
            expires_at: Instant::now() + self.ttl,
        };
        self.cache.insert(package_name.to_string(), entry);
    }
}
