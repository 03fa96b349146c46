//! Infrastructure layer - Providers, stores, services and logging

pub mod cache;
pub mod catalog;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod services;
pub mod usage;

pub use services::{AiOrchestrator, ScanOutcome, SessionContext};
