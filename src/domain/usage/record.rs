//! Usage sample entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote service an outbound call went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Generative model service
    Model,
    /// Anime/manga metadata API
    Catalog,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 2] = [ServiceKind::Model, ServiceKind::Catalog];
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Catalog => write!(f, "catalog"),
        }
    }
}

/// A single recorded outbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSample {
    pub timestamp: DateTime<Utc>,
    pub service: ServiceKind,
}

impl UsageSample {
    pub fn new(service: ServiceKind, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, service }
    }
}

/// Call count over the rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub service: ServiceKind,
    pub calls_in_window: usize,
    pub window_seconds: u64,
}

impl std::fmt::Display for UsageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} calls in the last {}s",
            self.service, self.calls_in_window, self.window_seconds
        )
    }
}

/// Soft warning raised when a service is called often within the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageWarning {
    pub stats: UsageStats,
    pub threshold: usize,
}

impl std::fmt::Display for UsageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "High {} usage: {} calls in the last {}s (soft limit {})",
            self.stats.service, self.stats.calls_in_window, self.stats.window_seconds, self.threshold
        )
    }
}
