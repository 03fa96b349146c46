//! Rolling-window usage tracker

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::domain::usage::{
    Clock, ServiceKind, SystemClock, UsageSample, UsageStats, UsageWarning,
};

/// Configuration for the usage tracker
#[derive(Debug, Clone, Copy)]
pub struct UsageTrackerConfig {
    pub window_secs: u64,
    /// Calls within the window at which a soft warning is raised
    pub warn_threshold: usize,
}

impl Default for UsageTrackerConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            warn_threshold: 15,
        }
    }
}

/// Counts outbound calls per service within a rolling window
///
/// Samples older than the window are pruned on every read and write, so a
/// count never includes a call made more than `window_secs` ago.
#[derive(Debug)]
pub struct UsageTracker {
    samples: Mutex<HashMap<ServiceKind, VecDeque<UsageSample>>>,
    clock: Arc<dyn Clock>,
    config: UsageTrackerConfig,
}

impl UsageTracker {
    pub fn new(config: UsageTrackerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: UsageTrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            samples: Mutex::new(HashMap::new()),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &UsageTrackerConfig {
        &self.config
    }

    /// Start of the window ending at `now`
    ///
    /// A window too long to represent covers every recorded call.
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.config.window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// A panic while the lock was held leaves only whole samples behind,
    /// so the map is still usable.
    fn samples(&self) -> MutexGuard<'_, HashMap<ServiceKind, VecDeque<UsageSample>>> {
        self.samples.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn prune(queue: &mut VecDeque<UsageSample>, cutoff: DateTime<Utc>) {
        while queue.front().is_some_and(|sample| sample.timestamp <= cutoff) {
            queue.pop_front();
        }
    }

    /// Record one outbound call to `service` at the current time
    pub fn record(&self, service: ServiceKind) {
        let now = self.clock.now();
        let cutoff = self.cutoff(now);

        let mut samples = self.samples();

        let queue = samples.entry(service).or_default();
        Self::prune(queue, cutoff);
        queue.push_back(UsageSample::new(service, now));

        let count = queue.len();
        drop(samples);

        if count >= self.config.warn_threshold {
            tracing::warn!(
                service = %service,
                calls = count,
                window_secs = self.config.window_secs,
                "High outbound call rate"
            );
        }
    }

    /// Calls to `service` within the window ending now
    pub fn stats(&self, service: ServiceKind) -> UsageStats {
        let cutoff = self.cutoff(self.clock.now());

        let mut samples = self.samples();

        let calls_in_window = match samples.get_mut(&service) {
            Some(queue) => {
                Self::prune(queue, cutoff);
                queue.len()
            }
            None => 0,
        };

        UsageStats {
            service,
            calls_in_window,
            window_seconds: self.config.window_secs,
        }
    }

    /// Soft warning when `service` exceeds the configured threshold
    pub fn warning(&self, service: ServiceKind) -> Option<UsageWarning> {
        let stats = self.stats(service);

        (stats.calls_in_window >= self.config.warn_threshold).then_some(UsageWarning {
            stats,
            threshold: self.config.warn_threshold,
        })
    }

    /// Stats for every tracked service
    pub fn report(&self) -> Vec<UsageStats> {
        ServiceKind::ALL
            .iter()
            .map(|service| self.stats(*service))
            .collect()
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(UsageTrackerConfig::default())
    }
}
