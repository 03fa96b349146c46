//! Completion results, stream fragments and the rate-limit retry policy

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainError;

/// Message delivered when every attempt was rate limited
pub const SERVICE_BUSY_MESSAGE: &str =
    "The AI service is busy right now (rate limit reached). Please try again in a minute.";

/// Classified result of one low-level provider call
#[derive(Debug)]
pub enum CallOutcome<T> {
    Ok(T),
    RateLimited(String),
    Error(String),
}

impl<T> CallOutcome<T> {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::RateLimited(_) => "rate_limited",
            Self::Error(_) => "error",
        }
    }
}

impl<T> From<Result<T, DomainError>> for CallOutcome<T> {
    fn from(result: Result<T, DomainError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) if e.is_rate_limited() => Self::RateLimited(e.to_string()),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// Why a stream ended in a degraded fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// Retries exhausted on rate limiting
    ServiceBusy,
    /// Any other failure, before or during the stream
    Failed,
}

/// One element of a completion stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamFragment {
    /// Genuine model output
    Content { text: String },
    /// Final human-readable message substituted for a failure
    Degraded { text: String, reason: DegradedReason },
}

impl StreamFragment {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    pub fn service_busy() -> Self {
        Self::Degraded {
            text: SERVICE_BUSY_MESSAGE.to_string(),
            reason: DegradedReason::ServiceBusy,
        }
    }

    pub fn failed(detail: impl AsRef<str>) -> Self {
        Self::Degraded {
            text: format!("AI Error: {}", detail.as_ref()),
            reason: DegradedReason::Failed,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Content { text } | Self::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Terminal failure of the non-streaming completion path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Completion failed: {message}")]
    Failed { message: String },
}

/// Fixed-delay retry policy applied to rate-limited calls only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay slept between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Whether another attempt may follow the given 1-based attempt number
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Full text gathered from a completion stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedText {
    pub text: String,
    pub degraded: Option<DegradedReason>,
}

impl CollectedText {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Concatenate a finished list of fragments
pub fn collect_fragments<I>(fragments: I) -> CollectedText
where
    I: IntoIterator<Item = StreamFragment>,
{
    let mut text = String::new();
    let mut degraded = None;

    for fragment in fragments {
        match fragment {
            StreamFragment::Content { text: t } => text.push_str(&t),
            StreamFragment::Degraded { text: t, reason } => {
                if !text.is_empty() {
                    text.push_str("\n\n");
                }
                text.push_str(&t);
                degraded = Some(reason);
            }
        }
    }

    CollectedText { text, degraded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_outcome_classification() {
        let ok: CallOutcome<u8> = Ok(1).into();
        assert!(matches!(ok, CallOutcome::Ok(1)));

        let limited: CallOutcome<u8> = Err(DomainError::rate_limited("gemini", "429")).into();
        assert!(limited.is_rate_limited());

        let failed: CallOutcome<u8> = Err(DomainError::provider("gemini", "500")).into();
        assert_eq!(failed.label(), "error");
    }

    #[test]
    fn test_retry_policy_bounds() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry_after(4));
        assert!(!policy.allows_retry_after(5));

        let at_least_one = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(at_least_one.max_attempts, 1);
    }

    #[test]
    fn test_collect_fragments_marks_degraded() {
        let collected = collect_fragments(vec![
            StreamFragment::content("Levi "),
            StreamFragment::content("Ackerman"),
            StreamFragment::failed("connection reset"),
        ]);

        assert_eq!(collected.degraded, Some(DegradedReason::Failed));
        assert!(collected.text.starts_with("Levi Ackerman\n\nAI Error:"));
    }

    #[test]
    fn test_service_busy_fragment() {
        let fragment = StreamFragment::service_busy();
        assert!(fragment.is_degraded());
        assert_eq!(fragment.text(), SERVICE_BUSY_MESSAGE);
    }
}
