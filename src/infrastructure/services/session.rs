//! Per-session state shared by the AI services

use std::sync::Arc;

use crate::domain::cache::ResponseCache;
use crate::infrastructure::cache::InMemoryResponseCache;
use crate::infrastructure::usage::UsageTracker;

/// Response cache and usage tracker for one user session
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub cache: Arc<dyn ResponseCache>,
    pub usage: Arc<UsageTracker>,
}

impl SessionContext {
    pub fn new(cache: Arc<dyn ResponseCache>, usage: Arc<UsageTracker>) -> Self {
        Self { cache, usage }
    }

    /// Unbounded in-memory cache and a default tracker
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryResponseCache::new()),
            Arc::new(UsageTracker::default()),
        )
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::in_memory()
    }
}
