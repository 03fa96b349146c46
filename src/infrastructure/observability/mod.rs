//! Observability infrastructure - Metrics counters

mod metrics;

pub use self::metrics::{CacheLookup, record_cache_lookup, record_completion_attempt, record_degraded_result};
