//! Usage tracking infrastructure

mod tracker;

pub use tracker::{UsageTracker, UsageTrackerConfig};
