//! itook AI
//!
//! Generative-AI helpers for an anime/manga discovery app:
//! - Streaming character profiles with a session response cache
//! - Image-based character identification
//! - Structured title recommendations
//! - Bounded retry on rate limiting and rolling-window usage tracking

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use infrastructure::{AiOrchestrator, ScanOutcome, SessionContext};
