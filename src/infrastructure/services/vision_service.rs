//! Image-based character identification

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use super::completion_service::CompletionClient;
use crate::domain::prompt::{PromptRequest, PromptSet};
use crate::domain::vision::VisionOutcome;
use crate::infrastructure::observability::record_degraded_result;

/// Asks the model to name the character in an image
#[derive(Debug, Clone)]
pub struct VisionService {
    completion: CompletionClient,
    prompts: Arc<PromptSet>,
}

impl VisionService {
    pub fn new(completion: CompletionClient, prompts: Arc<PromptSet>) -> Self {
        Self {
            completion,
            prompts,
        }
    }

    /// Best-effort label: a character name or exactly `"Unknown"`
    pub async fn classify(&self, image: impl Into<Bytes>) -> String {
        self.classify_detailed(image).await.into_label()
    }

    /// Keeps "not recognised" apart from "request failed"
    pub async fn classify_detailed(&self, image: impl Into<Bytes>) -> VisionOutcome {
        let image = image.into();
        if image.is_empty() {
            record_degraded_result("vision");
            return VisionOutcome::Failed("Empty image".to_string());
        }

        let request = match self.prompts.render(&PromptRequest::vision(image)) {
            Ok(request) => request,
            Err(e) => {
                record_degraded_result("vision");
                return VisionOutcome::Failed(e.to_string());
            }
        };

        match self.completion.complete(request).await {
            Ok(answer) => {
                let outcome = VisionOutcome::from_answer(&answer);
                debug!(outcome = ?outcome, "Vision classification finished");
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Vision classification failed");
                record_degraded_result("vision");
                VisionOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::completion::RetryPolicy;
    use crate::domain::llm::{MockLlmProvider, MockReply};
    use crate::domain::vision::UNKNOWN_LABEL;
    use crate::infrastructure::services::SessionContext;
    use std::time::Duration;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    fn service(provider: Arc<MockLlmProvider>) -> VisionService {
        let completion = CompletionClient::new(
            provider,
            "test-model",
            RetryPolicy::new(5, Duration::ZERO),
            SessionContext::in_memory(),
        );
        VisionService::new(completion, Arc::new(PromptSet::default()))
    }

    #[tokio::test]
    async fn test_recognized_name() {
        let provider = Arc::new(MockLlmProvider::replying("  \"Monkey D. Luffy\"\n"));
        let service = service(provider.clone());

        assert_eq!(service.classify(PNG).await, "Monkey D. Luffy");

        let request = &provider.requests()[0];
        assert!(request.messages[0].has_image());
    }

    #[tokio::test]
    async fn test_failure_maps_to_unknown() {
        let provider = Arc::new(MockLlmProvider::failing("socket closed"));
        let service = service(provider.clone());

        assert_eq!(service.classify(PNG).await, UNKNOWN_LABEL);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_detailed_outcome_separates_failure_from_unrecognized() {
        let failing = service(Arc::new(MockLlmProvider::failing("socket closed")));
        assert!(matches!(
            failing.classify_detailed(PNG).await,
            VisionOutcome::Failed(_)
        ));

        let unsure = service(Arc::new(MockLlmProvider::replying("Unknown.")));
        assert_eq!(
            unsure.classify_detailed(PNG).await,
            VisionOutcome::Unrecognized
        );
    }

    #[tokio::test]
    async fn test_rate_limits_are_retried() {
        let provider = Arc::new(
            MockLlmProvider::replying("Nami")
                .then(MockReply::RateLimited)
                .then(MockReply::RateLimited),
        );
        let service = service(provider.clone());

        assert_eq!(service.classify(PNG).await, "Nami");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_rate_limits_map_to_unknown() {
        let provider = Arc::new(MockLlmProvider::rate_limited());
        let service = service(provider.clone());

        assert_eq!(service.classify(PNG).await, UNKNOWN_LABEL);
        assert_eq!(provider.calls(), 5);
    }

    #[tokio::test]
    async fn test_empty_image_skips_the_call() {
        let provider = Arc::new(MockLlmProvider::replying("Zoro"));
        let service = service(provider.clone());

        assert_eq!(service.classify(Vec::new()).await, UNKNOWN_LABEL);
        assert_eq!(provider.calls(), 0);
    }
}
