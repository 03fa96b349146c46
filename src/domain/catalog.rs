//! Catalog metadata collaborator
//!
//! The core only needs character records; searching and filtering the
//! catalog is the surrounding application's business.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A character as returned by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Stable catalog identifier
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    /// Free-text biography, if the catalog has one
    pub about: Option<String>,
}

impl CharacterRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: None,
            about: None,
        }
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Read access to the catalog
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Best match for a character name, if any
    async fn find_character(&self, name: &str) -> Result<Option<CharacterRecord>, DomainError>;

    /// Character by catalog identifier
    async fn get_character(&self, id: &str) -> Result<Option<CharacterRecord>, DomainError>;
}
