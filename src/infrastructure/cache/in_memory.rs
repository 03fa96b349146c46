//! In-memory response cache using moka

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::DomainError;
use crate::domain::cache::{CacheEntry, CacheKey, ResponseCache};

/// Configuration for the in-memory response cache
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries; `None` keeps everything for the session
    pub max_capacity: Option<u64>,
}

impl InMemoryCacheConfig {
    /// Bounds the cache, evicting least-recently-used entries beyond `capacity`
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }
}

/// Session-scoped response cache
///
/// Entries never expire. `clear` invalidates every entry before returning,
/// so readers see either the old contents or an empty cache.
#[derive(Debug, Clone)]
pub struct InMemoryResponseCache {
    cache: MokaCache<CacheKey, CacheEntry>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let mut builder = MokaCache::builder();

        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, DomainError> {
        Ok(self.cache.get(key).await)
    }

    async fn put(&self, key: &CacheKey, text: &str) -> Result<(), DomainError> {
        self.cache
            .insert(key.clone(), CacheEntry::new(key.clone(), text))
            .await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
