//! Domain layer - Core entities, contracts and pure logic

pub mod cache;
pub mod catalog;
pub mod completion;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod recommendation;
pub mod usage;
pub mod vision;

pub use completion::{CallOutcome, CompletionError, DegradedReason, RetryPolicy, StreamFragment};
pub use error::DomainError;
pub use llm::{LlmProvider, LlmRequest, LlmResponse, LlmStream, Message};
pub use recommendation::{ContentType, RecommendationItem, ViewerProfile};
pub use vision::{UNKNOWN_LABEL, VisionOutcome};
