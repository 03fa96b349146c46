use std::sync::Arc;

use super::gemini::GeminiProvider;
use super::http_client::HttpClient;
use crate::config::GeminiConfig;
use crate::domain::DomainError;
use crate::domain::llm::LlmProvider;

/// Factory for creating model providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the Gemini provider described by the configuration
    pub fn create(config: &GeminiConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DomainError::configuration(
                "No Gemini API key: set gemini.api_key, GEMINI_API_KEY or GOOGLE_API_KEY",
            )
        })?;

        let http_client = HttpClient::with_timeout(config.timeout())?;

        Ok(Arc::new(GeminiProvider::with_base_url(
            http_client,
            api_key,
            &config.base_url,
        )))
    }
}
