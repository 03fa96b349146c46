//! Response cache domain - keys, entries and the cache trait

mod key;
mod repository;

pub use key::{CacheKey, CacheKeyParams, PROFILE_NAMESPACE};
pub use repository::{CacheEntry, ResponseCache};

#[cfg(test)]
pub use repository::mock::MockResponseCache;
