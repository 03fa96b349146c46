//! Jikan (MyAnimeList) catalog client

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::catalog::{CatalogClient, CharacterRecord};
use crate::domain::usage::ServiceKind;
use crate::infrastructure::llm::HttpClientTrait;
use crate::infrastructure::usage::UsageTracker;

pub const DEFAULT_JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";

#[derive(Debug, Deserialize)]
struct JikanCharacter {
    mal_id: u64,
    name: String,
    #[serde(default)]
    images: Option<JikanImages>,
    #[serde(default)]
    about: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanImages {
    #[serde(default)]
    jpg: Option<JikanImage>,
}

#[derive(Debug, Deserialize)]
struct JikanImage {
    #[serde(default)]
    image_url: Option<String>,
}

impl From<JikanCharacter> for CharacterRecord {
    fn from(character: JikanCharacter) -> Self {
        Self {
            id: character.mal_id.to_string(),
            name: character.name,
            image_url: character
                .images
                .and_then(|images| images.jpg)
                .and_then(|jpg| jpg.image_url),
            about: character.about.filter(|about| !about.trim().is_empty()),
        }
    }
}

/// Catalog client backed by the public Jikan REST API
#[derive(Debug)]
pub struct JikanCatalogClient<C: HttpClientTrait> {
    client: C,
    base_url: String,
    usage: Arc<UsageTracker>,
}

impl<C: HttpClientTrait> JikanCatalogClient<C> {
    pub fn new(client: C, usage: Arc<UsageTracker>) -> Self {
        Self::with_base_url(client, DEFAULT_JIKAN_BASE_URL, usage)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>, usage: Arc<UsageTracker>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            usage,
        }
    }

    fn search_url(&self, name: &str) -> Result<String, DomainError> {
        reqwest::Url::parse_with_params(
            &format!("{}/characters", self.base_url),
            &[("q", name), ("limit", "1")],
        )
        .map(String::from)
        .map_err(|e| DomainError::configuration(format!("Invalid catalog URL: {}", e)))
    }

    async fn fetch(&self, url: &str) -> Result<serde_json::Value, DomainError> {
        self.usage.record(ServiceKind::Catalog);
        debug!(url = %url, "Catalog request");

        self.client
            .get_json(url, vec![("Accept", "application/json")])
            .await
            .map_err(|e| DomainError::catalog(e.to_string()))
    }
}

#[async_trait]
impl<C: HttpClientTrait> CatalogClient for JikanCatalogClient<C> {
    async fn find_character(&self, name: &str) -> Result<Option<CharacterRecord>, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let body = self.fetch(&self.search_url(name)?).await?;

        let characters: Vec<JikanCharacter> = match body.get("data") {
            Some(data) if !data.is_null() => serde_json::from_value(data.clone())
                .map_err(|e| DomainError::catalog(format!("Unexpected search payload: {}", e)))?,
            _ => Vec::new(),
        };

        Ok(characters.into_iter().next().map(CharacterRecord::from))
    }

    async fn get_character(&self, id: &str) -> Result<Option<CharacterRecord>, DomainError> {
        let url = format!("{}/characters/{}", self.base_url, id.trim());
        let body = self.fetch(&url).await?;

        match body.get("data") {
            Some(data) if !data.is_null() => {
                let character: JikanCharacter = serde_json::from_value(data.clone())
                    .map_err(|e| DomainError::catalog(format!("Unexpected character payload: {}", e)))?;
                Ok(Some(character.into()))
            }
            _ => Ok(None),
        }
    }
}
