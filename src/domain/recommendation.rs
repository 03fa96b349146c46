//! Structured recommendation parsing
//!
//! The model is asked for a bare JSON array. Responses are accepted only as a
//! whole: one malformed item discards the list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of titles to recommend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Anime,
    Manga,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anime => write!(f, "Anime"),
            Self::Manga => write!(f, "Manga"),
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anime" => Ok(Self::Anime),
            "manga" => Ok(Self::Manga),
            other => Err(format!("unknown content type '{}'", other)),
        }
    }
}

/// What the viewer told us about themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerProfile {
    pub age: u32,
    pub interests: String,
    pub mood: String,
    pub style: String,
    pub content_type: ContentType,
}

/// One recommended title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub title: String,
    #[serde(default)]
    pub genre: String,
    pub reason: String,
}

/// Why a raw response was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendationParseError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Item {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

/// Strips a surrounding triple-backtick fence and its optional language tag
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();

    let Some(start) = text.find("```") else {
        return text;
    };

    let after_open = &text[start + 3..];
    // language tag runs to the end of the opening line
    let body = match after_open.find('\n') {
        Some(newline) if is_language_tag(&after_open[..newline]) => &after_open[newline + 1..],
        _ => after_open
            .strip_prefix("json")
            .unwrap_or(after_open),
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parses a model response into a complete list of items
pub fn parse_recommendations(
    raw: &str,
) -> Result<Vec<RecommendationItem>, RecommendationParseError> {
    let body = strip_code_fence(raw);

    let items: Vec<RecommendationItem> = serde_json::from_str(body)
        .map_err(|e| RecommendationParseError::InvalidJson(e.to_string()))?;

    let items = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let item = RecommendationItem {
                title: item.title.trim().to_string(),
                genre: item.genre.trim().to_string(),
                reason: item.reason.trim().to_string(),
            };

            if item.title.is_empty() {
                return Err(RecommendationParseError::EmptyField {
                    index,
                    field: "title",
                });
            }
            if item.reason.is_empty() {
                return Err(RecommendationParseError::EmptyField {
                    index,
                    field: "reason",
                });
            }

            Ok(item)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}
