use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::response::StreamChunk;
use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Stream type for raw provider responses
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, DomainError>> + Send>>;

/// A remote generative model
///
/// Implementations report quota exhaustion as [`DomainError::RateLimited`];
/// every other failure is a plain error.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a single non-streamed generation request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Send a streaming generation request
    async fn chat_stream(&self, model: &str, request: LlmRequest)
    -> Result<LlmStream, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// What the mock answers for one call
    #[derive(Debug, Clone)]
    pub enum MockReply {
        Text(String),
        RateLimited,
        Error(String),
        /// Streams the given pieces and then fails mid-stream
        StreamThenFail(Vec<String>, String),
        /// Opens a stream whose first event is a rate-limit error
        StreamRateLimited,
    }

    /// Scripted provider: replies are consumed in order, then `fallback` repeats
    #[derive(Debug)]
    pub struct MockLlmProvider {
        replies: Mutex<VecDeque<MockReply>>,
        fallback: MockReply,
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(fallback: MockReply) -> Self {
            Self {
                replies: Mutex::new(VecDeque::new()),
                fallback,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(text: impl Into<String>) -> Self {
            Self::new(MockReply::Text(text.into()))
        }

        pub fn rate_limited() -> Self {
            Self::new(MockReply::RateLimited)
        }

        pub fn failing(error: impl Into<String>) -> Self {
            Self::new(MockReply::Error(error.into()))
        }

        pub fn then(self, reply: MockReply) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn next_reply(&self, request: &LlmRequest) -> MockReply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    fn split_words(text: &str) -> Vec<String> {
        text.split_inclusive(' ').map(str::to_string).collect()
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            match self.next_reply(&request) {
                MockReply::Text(text) => Ok(LlmResponse::new(model, text)),
                MockReply::RateLimited | MockReply::StreamRateLimited => {
                    Err(DomainError::rate_limited("mock", "quota exhausted"))
                }
                MockReply::Error(error) | MockReply::StreamThenFail(_, error) => {
                    Err(DomainError::provider("mock", error))
                }
            }
        }

        async fn chat_stream(
            &self,
            _model: &str,
            request: LlmRequest,
        ) -> Result<LlmStream, DomainError> {
            let items: Vec<Result<StreamChunk, DomainError>> = match self.next_reply(&request) {
                MockReply::Text(text) => split_words(&text)
                    .into_iter()
                    .map(|w| Ok(StreamChunk::new().with_delta(w)))
                    .collect(),
                MockReply::RateLimited => {
                    return Err(DomainError::rate_limited("mock", "quota exhausted"));
                }
                MockReply::Error(error) => return Err(DomainError::provider("mock", error)),
                MockReply::StreamThenFail(pieces, error) => pieces
                    .into_iter()
                    .map(|p| Ok(StreamChunk::new().with_delta(p)))
                    .chain(std::iter::once(Err(DomainError::provider("mock", error))))
                    .collect(),
                MockReply::StreamRateLimited => {
                    vec![Err(DomainError::rate_limited("mock", "quota exhausted"))]
                }
            };

            Ok(Box::pin(stream::iter(items)))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
