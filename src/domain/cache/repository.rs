//! Response cache trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CacheKey;
use crate::domain::DomainError;

/// A cached completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Session-scoped store of previously generated completions
#[async_trait]
pub trait ResponseCache: Send + Sync + Debug {
    /// Gets a cached entry
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, DomainError>;

    /// Stores (or replaces) the text for a key
    async fn put(&self, key: &CacheKey, text: &str) -> Result<(), DomainError>;

    /// Removes every entry; no reader observes a partially cleared cache
    async fn clear(&self) -> Result<(), DomainError>;

    /// Number of entries currently held
    async fn len(&self) -> Result<usize, DomainError>;

    async fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len().await? == 0)
    }
}
