//! Completion client with bounded retry on rate limiting

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt, future, stream};
use tracing::{debug, info, warn};

use super::session::SessionContext;
use crate::domain::DomainError;
use crate::domain::completion::{CallOutcome, CompletionError, RetryPolicy, StreamFragment};
use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponse, LlmStream};
use crate::domain::usage::ServiceKind;
use crate::infrastructure::observability::{record_completion_attempt, record_degraded_result};

/// Stream of completion fragments; never yields an error item
pub type FragmentStream = Pin<Box<dyn Stream<Item = StreamFragment> + Send>>;

/// Issues prompts to the model provider
///
/// Rate-limited calls are retried with a fixed delay up to the policy's
/// attempt bound. Any other error ends the call immediately. Every attempt is
/// recorded in the session's usage tracker.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    policy: RetryPolicy,
    session: SessionContext,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        policy: RetryPolicy,
        session: SessionContext,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            policy,
            session,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Non-streamed completion
    pub async fn complete(&self, request: LlmRequest) -> Result<String, CompletionError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.session.usage.record(ServiceKind::Model);

            let outcome: CallOutcome<LlmResponse> = self
                .provider
                .chat(&self.model, request.clone())
                .await
                .into();
            record_completion_attempt(outcome.label());

            match outcome {
                CallOutcome::Ok(response) => {
                    debug!(attempt, model = %self.model, "Completion succeeded");
                    return Ok(response.text);
                }
                CallOutcome::RateLimited(detail) => {
                    if !self.policy.allows_retry_after(attempt) {
                        warn!(attempts = attempt, detail = %detail, "Rate limit retries exhausted");
                        return Err(CompletionError::RateLimited { attempts: attempt });
                    }
                    info!(
                        attempt,
                        delay_ms = self.policy.delay.as_millis() as u64,
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                CallOutcome::Error(message) => {
                    warn!(attempt, error = %message, "Completion failed");
                    return Err(CompletionError::Failed { message });
                }
            }
        }
    }

    /// Opens the provider stream, retrying while rate limited
    ///
    /// On failure returns the degraded fragment the caller should see.
    async fn open_stream(&self, request: LlmRequest) -> Result<LlmStream, StreamFragment> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.session.usage.record(ServiceKind::Model);

            let opened = match self.provider.chat_stream(&self.model, request.clone()).await {
                Ok(stream) => first_event(stream).await,
                Err(e) => Err(e),
            };
            let outcome: CallOutcome<LlmStream> = opened.into();
            record_completion_attempt(outcome.label());

            match outcome {
                CallOutcome::Ok(stream) => {
                    debug!(attempt, model = %self.model, "Completion stream opened");
                    return Ok(stream);
                }
                CallOutcome::RateLimited(detail) => {
                    if !self.policy.allows_retry_after(attempt) {
                        warn!(attempts = attempt, detail = %detail, "Rate limit retries exhausted");
                        return Err(StreamFragment::service_busy());
                    }
                    info!(
                        attempt,
                        delay_ms = self.policy.delay.as_millis() as u64,
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                CallOutcome::Error(message) => {
                    warn!(attempt, error = %message, "Completion stream failed to open");
                    return Err(StreamFragment::failed(message));
                }
            }
        }
    }

    /// Streamed completion
    ///
    /// Nothing is sent until the stream is first polled. Exhausted retries
    /// yield a single service-busy fragment; any other failure, including one
    /// in the middle of the stream, ends it with a failed fragment.
    pub fn complete_stream(&self, mut request: LlmRequest) -> FragmentStream {
        request.stream = true;
        let client = self.clone();

        stream::once(async move { client.open_stream(request).await })
            .flat_map(|opened| match opened {
                Ok(stream) => content_fragments(stream),
                Err(fragment) => {
                    record_degraded_result("completion");
                    stream::iter([fragment]).boxed()
                }
            })
            .boxed()
    }
}

/// Polls the first event of a freshly opened stream
///
/// A rate limit reported as the first event fails the attempt so it is
/// retried like a refused request. Anything else is put back in front.
async fn first_event(mut stream: LlmStream) -> Result<LlmStream, DomainError> {
    match stream.next().await {
        Some(Err(e)) if e.is_rate_limited() => Err(e),
        Some(first) => Ok(Box::pin(stream::once(future::ready(first)).chain(stream))),
        None => Ok(stream),
    }
}

/// Maps provider chunks to fragments, stopping after the first error
fn content_fragments(stream: LlmStream) -> FragmentStream {
    stream
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }

            let fragment = match item {
                Ok(chunk) => chunk
                    .delta
                    .filter(|delta| !delta.is_empty())
                    .map(StreamFragment::content),
                Err(e) => {
                    *failed = true;
                    warn!(error = %e, "Completion stream broke off");
                    record_degraded_result("completion");
                    Some(StreamFragment::failed(e.to_string()))
                }
            };

            future::ready(Some(fragment))
        })
        .filter_map(future::ready)
        .boxed()
}
