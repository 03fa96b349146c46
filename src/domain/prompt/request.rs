//! Per-action prompt requests

use bytes::Bytes;

use crate::domain::cache::CacheKey;
use crate::domain::catalog::CharacterRecord;
use crate::domain::llm::LlmResponseFormat;
use crate::domain::recommendation::ViewerProfile;
use crate::domain::vision::sniff_mime_type;

/// Default character budget for biography text sent to the model
pub const DEFAULT_DESCRIPTION_BUDGET: usize = 2000;

/// Marker appended to truncated descriptions
pub const TRUNCATION_MARKER: &str = "...";

/// Placeholder for missing biography or name fields
pub const MISSING_FIELD: &str = "N/A";

/// Cuts `text` to at most `budget` characters, appending the marker when cut
pub fn truncate_description(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Which prompt a request renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Profile,
    Vision,
    Recommendation,
}

/// The entity a prompt is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSubject {
    /// A catalog character; `description` is already truncated
    Character {
        id: String,
        name: String,
        description: String,
    },
    Image { bytes: Bytes, mime_type: String },
    Viewer(ViewerProfile),
}

/// Immutable description of one model call, built per user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    kind: PromptKind,
    subject: PromptSubject,
    constraints: Option<LlmResponseFormat>,
}

impl PromptRequest {
    /// Profile request for a character, truncating its biography to `budget`
    pub fn profile(record: &CharacterRecord, budget: usize) -> Self {
        let name = if record.name.trim().is_empty() {
            MISSING_FIELD.to_string()
        } else {
            record.name.clone()
        };
        let description = match record.about.as_deref().map(str::trim) {
            Some(about) if !about.is_empty() => truncate_description(about, budget),
            _ => MISSING_FIELD.to_string(),
        };

        Self {
            kind: PromptKind::Profile,
            subject: PromptSubject::Character {
                id: record.id.clone(),
                name,
                description,
            },
            constraints: None,
        }
    }

    pub fn vision(image: impl Into<Bytes>) -> Self {
        let bytes = image.into();
        let mime_type = sniff_mime_type(&bytes).to_string();

        Self {
            kind: PromptKind::Vision,
            subject: PromptSubject::Image { bytes, mime_type },
            constraints: None,
        }
    }

    pub fn recommendation(profile: ViewerProfile) -> Self {
        Self {
            kind: PromptKind::Recommendation,
            subject: PromptSubject::Viewer(profile),
            constraints: Some(LlmResponseFormat::Json),
        }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn subject(&self) -> &PromptSubject {
        &self.subject
    }

    pub fn constraints(&self) -> Option<LlmResponseFormat> {
        self.constraints
    }

    /// Response Cache key; only profile requests are cached
    pub fn cache_key(&self) -> Option<CacheKey> {
        match (&self.kind, &self.subject) {
            (
                PromptKind::Profile,
                PromptSubject::Character {
                    id,
                    name,
                    description,
                },
            ) => Some(CacheKey::profile(id, name, description)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_description_short_text_untouched() {
        assert_eq!(truncate_description("short bio", 2000), "short bio");
    }

    #[test]
    fn test_truncate_description_long_text() {
        let long = "a".repeat(2500);
        let truncated = truncate_description(&long, 2000);

        assert_eq!(truncated.len(), 2003);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_description_exact_budget_untouched() {
        let exact = "b".repeat(2000);
        assert_eq!(truncate_description(&exact, 2000), exact);
    }

    #[test]
    fn test_truncate_description_respects_char_boundaries() {
        let text = "進撃の巨人".repeat(10);
        let truncated = truncate_description(&text, 7);
        assert_eq!(truncated, "進撃の巨人進撃...");
    }

    #[test]
    fn test_profile_request_fills_missing_fields() {
        let record = CharacterRecord::new("7", "");
        let request = PromptRequest::profile(&record, 2000);

        assert_eq!(
            request.subject(),
            &PromptSubject::Character {
                id: "7".to_string(),
                name: MISSING_FIELD.to_string(),
                description: MISSING_FIELD.to_string(),
            }
        );
    }

    #[test]
    fn test_profile_cache_key_tracks_sent_text() {
        let base = "x".repeat(2100);
        let edited_past_budget = format!("{}y", base);

        let a = PromptRequest::profile(&CharacterRecord::new("1", "Eren").with_about(&base), 2000);
        let b = PromptRequest::profile(
            &CharacterRecord::new("1", "Eren").with_about(&edited_past_budget),
            2000,
        );
        let c = PromptRequest::profile(&CharacterRecord::new("1", "Eren").with_about("other"), 2000);

        // same text is sent for a and b, so the same profile is valid for both
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_only_profile_requests_have_cache_keys() {
        let vision = PromptRequest::vision(vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(vision.cache_key(), None);
        assert_eq!(vision.kind(), PromptKind::Vision);
    }
}
