//! Usage tracking domain
//!
//! Outbound calls to the model and catalog services are recorded as
//! timestamped samples and counted over a rolling window. The counts are
//! advisory: nothing here blocks or rejects a call.

mod clock;
mod record;

pub use clock::{Clock, ManualClock, SystemClock};
pub use record::{ServiceKind, UsageSample, UsageStats, UsageWarning};
