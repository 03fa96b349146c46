//! Entry point tying the AI services to one session

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::completion_service::{CompletionClient, FragmentStream};
use super::profile_service::ProfileService;
use super::recommendation_service::RecommendationService;
use super::session::SessionContext;
use super::vision_service::VisionService;
use crate::config::AppConfig;
use crate::domain::DomainError;
use crate::domain::catalog::{CatalogClient, CharacterRecord};
use crate::domain::completion::RetryPolicy;
use crate::domain::llm::LlmProvider;
use crate::domain::prompt::{DEFAULT_DESCRIPTION_BUDGET, PromptSet};
use crate::domain::recommendation::{RecommendationItem, ViewerProfile};
use crate::domain::usage::{ServiceKind, UsageStats, UsageWarning};
use crate::domain::vision::VisionOutcome;
use crate::infrastructure::cache::{InMemoryCacheConfig, InMemoryResponseCache};
use crate::infrastructure::catalog::JikanCatalogClient;
use crate::infrastructure::llm::{HttpClient, LlmProviderFactory};
use crate::infrastructure::usage::{UsageTracker, UsageTrackerConfig};

/// Settings shared by the services an orchestrator builds
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub model: String,
    pub retry: RetryPolicy,
    pub prompts: PromptSet,
    pub description_budget: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            retry: RetryPolicy::default(),
            prompts: PromptSet::default(),
            description_budget: DEFAULT_DESCRIPTION_BUDGET,
        }
    }
}

/// Result of identifying a character from an image
pub enum ScanOutcome {
    /// The image was not recognised, or classification failed
    Unidentified,
    /// The model named a character the catalog does not know
    NotInCatalog(String),
    /// Catalog record and its streaming profile
    Profile {
        record: CharacterRecord,
        stream: FragmentStream,
    },
}

impl std::fmt::Debug for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unidentified => write!(f, "Unidentified"),
            Self::NotInCatalog(name) => f.debug_tuple("NotInCatalog").field(name).finish(),
            Self::Profile { record, .. } => f
                .debug_struct("Profile")
                .field("record", record)
                .finish_non_exhaustive(),
        }
    }
}

/// Owns one session and the services that read and write it
pub struct AiOrchestrator {
    session: SessionContext,
    catalog: Arc<dyn CatalogClient>,
    profiles: ProfileService,
    vision: VisionService,
    recommendations: RecommendationService,
}

impl AiOrchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        catalog: Arc<dyn CatalogClient>,
        session: SessionContext,
        settings: OrchestratorSettings,
    ) -> Self {
        let completion =
            CompletionClient::new(provider, settings.model, settings.retry, session.clone());
        let prompts = Arc::new(settings.prompts);

        Self {
            profiles: ProfileService::new(completion.clone(), prompts.clone(), session.clone())
                .with_description_budget(settings.description_budget),
            vision: VisionService::new(completion.clone(), prompts.clone()),
            recommendations: RecommendationService::new(completion, prompts),
            session,
            catalog,
        }
    }

    /// Gemini provider, Jikan catalog and a fresh in-memory session
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let provider = LlmProviderFactory::create(&config.gemini)?;

        let usage = Arc::new(UsageTracker::new(UsageTrackerConfig {
            window_secs: config.usage.window_secs,
            warn_threshold: config.usage.warn_threshold,
        }));
        let cache = Arc::new(InMemoryResponseCache::with_config(InMemoryCacheConfig {
            max_capacity: config.cache.max_entries,
        }));
        let session = SessionContext::new(cache, usage.clone());

        let catalog = Arc::new(JikanCatalogClient::with_base_url(
            HttpClient::with_timeout(config.gemini.timeout())?,
            &config.catalog.base_url,
            usage,
        ));

        let prompts = config
            .prompts
            .prompt_set()
            .map_err(|e| DomainError::configuration(format!("Invalid prompt template: {}", e)))?;

        let settings = OrchestratorSettings {
            model: config.gemini.model.clone(),
            retry: config.retry.policy(),
            prompts,
            description_budget: config.cache.description_budget,
        };

        info!(
            model = %settings.model,
            max_attempts = settings.retry.max_attempts,
            "AI orchestrator ready"
        );

        Ok(Self::new(provider, catalog, session, settings))
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Catalog lookup by name
    pub async fn find_character(&self, name: &str) -> Result<Option<CharacterRecord>, DomainError> {
        self.catalog.find_character(name).await
    }

    /// Streaming profile for a catalog record
    pub fn analyze_character(&self, record: &CharacterRecord) -> FragmentStream {
        self.profiles.stream_profile(record)
    }

    /// Classify an image, look the name up and stream its profile
    #[instrument(skip_all)]
    pub async fn scan_character(&self, image: impl Into<Bytes>) -> Result<ScanOutcome, DomainError> {
        let name = match self.vision.classify_detailed(image).await {
            VisionOutcome::Recognized(name) => name,
            VisionOutcome::Unrecognized => return Ok(ScanOutcome::Unidentified),
            VisionOutcome::Failed(reason) => {
                warn!(reason = %reason, "Scan could not classify the image");
                return Ok(ScanOutcome::Unidentified);
            }
        };

        match self.catalog.find_character(&name).await? {
            Some(record) => {
                let stream = self.analyze_character(&record);
                Ok(ScanOutcome::Profile { record, stream })
            }
            None => {
                info!(name = %name, "Recognised character not in catalog");
                Ok(ScanOutcome::NotInCatalog(name))
            }
        }
    }

    pub async fn recommend(&self, profile: ViewerProfile) -> Vec<RecommendationItem> {
        self.recommendations.recommend(profile).await
    }

    /// Call counts for every tracked service
    pub fn usage_report(&self) -> Vec<UsageStats> {
        self.session.usage.report()
    }

    /// Advisory warnings for services over the soft threshold
    pub fn usage_warnings(&self) -> Vec<UsageWarning> {
        ServiceKind::ALL
            .into_iter()
            .filter_map(|service| self.session.usage.warning(service))
            .collect()
    }

    pub async fn clear_cache(&self) -> Result<(), DomainError> {
        self.session.cache.clear().await?;
        info!("Profile cache cleared");
        Ok(())
    }
}
