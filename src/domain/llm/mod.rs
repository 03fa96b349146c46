//! Generative model domain types and the provider trait

mod message;
mod provider;
mod request;
mod response;

pub use message::{ContentPart, Message, MessageRole};
pub use provider::{LlmProvider, LlmStream};
pub use request::{LlmRequest, LlmRequestBuilder, LlmResponseFormat};
pub use response::{FinishReason, LlmResponse, StreamChunk, TokenUsage};

#[cfg(test)]
pub use provider::mock::{MockLlmProvider, MockReply};
