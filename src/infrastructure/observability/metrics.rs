//! Counters for completion attempts, cache lookups and degraded results
//!
//! Emitted through the `metrics` facade; without an installed recorder they
//! are no-ops.

use metrics::counter;

/// Result of a profile cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    Error,
}

impl CacheLookup {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
        }
    }
}

/// Record one low-level model call, labelled `ok`, `rate_limited` or `error`
pub fn record_completion_attempt(outcome: &'static str) {
    counter!("ai_completion_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a profile cache lookup
pub fn record_cache_lookup(lookup: CacheLookup) {
    counter!("ai_profile_cache_total", "result" => lookup.as_str()).increment(1);
}

/// Record a user-visible fallback on the given path (`profile`, `vision`, `recommendation`)
pub fn record_degraded_result(path: &'static str) {
    counter!("ai_degraded_results_total", "path" => path).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_lookup_labels() {
        assert_eq!(CacheLookup::Hit.as_str(), "hit");
        assert_eq!(CacheLookup::Miss.as_str(), "miss");
        assert_eq!(CacheLookup::Error.as_str(), "error");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_completion_attempt("ok");
        record_cache_lookup(CacheLookup::Miss);
        record_degraded_result("vision");
    }
}
