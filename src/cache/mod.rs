//! Short-lived cache of per-backend search responses

use crate::engines::ProviderResult;
use moka::future::Cache;
use std::time::Duration;

/// Cache of successful backend responses, keyed by [`query_cache_key`]
#[derive(Clone)]
pub struct ResultCache {
    cache: Cache<String, Vec<ProviderResult>>,
}

impl ResultCache {
    /// Create a new result cache with specified TTL
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    /// Get a cached response
    pub async fn get(&self, key: &str) -> Option<Vec<ProviderResult>> {
        self.cache.get(key).await
    }

    /// Store a response
    pub async fn set(&self, key: String, value: Vec<ProviderResult>) {
        self.cache.insert(key, value).await;
    }

    /// Remove a cached response
    pub async fn remove(&self, key: &str) {
        self.cache.remove(key).await;
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(300, 1000)
    }
}

/// Cache key for one backend's answer to a query
pub fn query_cache_key(backend: &str, query: &str, limit: u32) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(backend.as_bytes());
    hasher.update([0u8]);
    hasher.update(query.as_bytes());
    hasher.update([0u8]);
    hasher.update(limit.to_be_bytes());

    format!("{:x}", hasher.finalize())
}
