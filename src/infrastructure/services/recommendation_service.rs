//! Structured recommendations

use std::sync::Arc;

use tracing::{debug, warn};

use super::completion_service::CompletionClient;
use crate::domain::prompt::{PromptRequest, PromptSet};
use crate::domain::recommendation::{RecommendationItem, ViewerProfile, parse_recommendations};
use crate::infrastructure::observability::record_degraded_result;

/// Generates typed recommendations from a viewer profile
///
/// All or nothing: any failure, including one malformed item, yields an
/// empty list.
#[derive(Debug, Clone)]
pub struct RecommendationService {
    completion: CompletionClient,
    prompts: Arc<PromptSet>,
}

impl RecommendationService {
    pub fn new(completion: CompletionClient, prompts: Arc<PromptSet>) -> Self {
        Self {
            completion,
            prompts,
        }
    }

    pub async fn recommend(&self, profile: ViewerProfile) -> Vec<RecommendationItem> {
        let request = match self.prompts.render(&PromptRequest::recommendation(profile)) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to render recommendation prompt");
                record_degraded_result("recommendation");
                return Vec::new();
            }
        };

        let raw = match self.completion.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Recommendation request failed");
                record_degraded_result("recommendation");
                return Vec::new();
            }
        };

        match parse_recommendations(&raw) {
            Ok(items) => {
                debug!(count = items.len(), "Recommendations parsed");
                items
            }
            Err(e) => {
                warn!(error = %e, "Discarding malformed recommendations");
                record_degraded_result("recommendation");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::completion::RetryPolicy;
    use crate::domain::llm::{LlmResponseFormat, MockLlmProvider, MockReply};
    use crate::domain::recommendation::ContentType;
    use crate::infrastructure::services::SessionContext;
    use std::time::Duration;

    fn service(provider: Arc<MockLlmProvider>) -> RecommendationService {
        let completion = CompletionClient::new(
            provider,
            "test-model",
            RetryPolicy::new(5, Duration::ZERO),
            SessionContext::in_memory(),
        );
        RecommendationService::new(completion, Arc::new(PromptSet::default()))
    }

    fn viewer() -> ViewerProfile {
        ViewerProfile {
            age: 24,
            interests: "space, mecha".to_string(),
            mood: "Hyped".to_string(),
            style: "Action".to_string(),
            content_type: ContentType::Anime,
        }
    }

    #[tokio::test]
    async fn test_not_json_yields_empty() {
        let service = service(Arc::new(MockLlmProvider::replying("not json at all")));
        assert!(service.recommend(viewer()).await.is_empty());
    }

    #[tokio::test]
    async fn test_fenced_json_yields_one_item() {
        let raw = "```json\n[{\"title\":\"A\",\"genre\":\"G\",\"reason\":\"R\"}]\n```";
        let service = service(Arc::new(MockLlmProvider::replying(raw)));

        assert_eq!(
            service.recommend(viewer()).await,
            vec![RecommendationItem {
                title: "A".to_string(),
                genre: "G".to_string(),
                reason: "R".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_one_bad_item_discards_all() {
        let raw = r#"[{"title":"A","genre":"G","reason":"R"},{"title":"","genre":"G","reason":"R"}]"#;
        let service = service(Arc::new(MockLlmProvider::replying(raw)));

        assert!(service.recommend(viewer()).await.is_empty());
    }

    #[tokio::test]
    async fn test_remote_error_yields_empty() {
        let provider = Arc::new(MockLlmProvider::failing("boom"));
        let service = service(provider.clone());

        assert!(service.recommend(viewer()).await.is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let provider = Arc::new(
            MockLlmProvider::replying(r#"[{"title":"Planetes","genre":"Sci-Fi","reason":"Space."}]"#)
                .then(MockReply::RateLimited),
        );
        let service = service(provider.clone());

        let items = service.recommend(viewer()).await;
        assert_eq!(items.len(), 1);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_requests_json_output() {
        let provider = Arc::new(MockLlmProvider::replying("[]"));
        let service = service(provider.clone());

        service.recommend(viewer()).await;

        let request = &provider.requests()[0];
        assert_eq!(request.response_format, LlmResponseFormat::Json);
        assert!(request.messages[0].text().contains("24 years old"));
    }
}
