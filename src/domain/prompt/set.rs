//! The three prompts the core sends and how requests are rendered into them

use std::collections::HashMap;

use super::request::{PromptRequest, PromptSubject};
use super::template::{PromptTemplate, TemplateError};
use crate::domain::llm::{LlmRequest, LlmResponseFormat, Message};

pub const DEFAULT_PROFILE_PROMPT: &str = "You are an expert Anime Otaku. Write an engaging profile for this character in ENGLISH.
Character Name: ${var:name}
Bio Data: ${var:about}

Requirements:
1. Catchy Title.
2. Fun and enthusiastic tone (use emojis 🌟🔥).
3. Analyze personality & powers.
4. Keep it under 200 words.";

pub const DEFAULT_VISION_PROMPT: &str =
    "Look at this anime character. Return ONLY the full name. If unsure, return 'Unknown'.";

pub const DEFAULT_RECOMMENDATION_PROMPT: &str = r#"Act as an Anime/Manga expert. Recommend 3 ${var:content_type} titles.
User Info: ${var:age} years old.
Mood: ${var:mood}.
Preferred Style: ${var:style}.
Interests: ${var:interests}.

Answer with ONLY a JSON array (no prose, no markdown fences) in exactly this format:
[
    {"title": "Name", "genre": "Genre", "reason": "Why it fits"}
]"#;

const PROFILE_VARIABLES: &[&str] = &["name", "about"];
const RECOMMENDATION_VARIABLES: &[&str] = &["content_type", "age", "mood", "style", "interests"];

/// Validated prompt templates
#[derive(Debug, Clone)]
pub struct PromptSet {
    profile: PromptTemplate,
    vision: String,
    recommendation: PromptTemplate,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            profile: PromptTemplate::parse(DEFAULT_PROFILE_PROMPT),
            vision: DEFAULT_VISION_PROMPT.to_string(),
            recommendation: PromptTemplate::parse(DEFAULT_RECOMMENDATION_PROMPT),
        }
    }
}

impl PromptSet {
    /// Builds a set from configured text, rejecting unknown variables up front
    pub fn new(
        profile: &str,
        vision: &str,
        recommendation: &str,
    ) -> Result<Self, TemplateError> {
        let profile = PromptTemplate::parse(profile);
        profile.expect_variables(PROFILE_VARIABLES)?;

        let recommendation = PromptTemplate::parse(recommendation);
        recommendation.expect_variables(RECOMMENDATION_VARIABLES)?;

        Ok(Self {
            profile,
            vision: vision.to_string(),
            recommendation,
        })
    }

    /// Renders a request into the model call it describes
    pub fn render(&self, request: &PromptRequest) -> Result<LlmRequest, TemplateError> {
        let message = match request.subject() {
            PromptSubject::Character {
                name, description, ..
            } => {
                let values = HashMap::from([
                    ("name", name.clone()),
                    ("about", description.clone()),
                ]);
                Message::user(self.profile.render(&values)?)
            }
            PromptSubject::Image { bytes, mime_type } => {
                Message::user_with_image(self.vision.clone(), bytes, mime_type.clone())
            }
            PromptSubject::Viewer(profile) => {
                let values = HashMap::from([
                    ("content_type", profile.content_type.to_string()),
                    ("age", profile.age.to_string()),
                    ("mood", profile.mood.clone()),
                    ("style", profile.style.clone()),
                    ("interests", profile.interests.clone()),
                ]);
                Message::user(self.recommendation.render(&values)?)
            }
        };

        let mut llm_request = LlmRequest::new(vec![message]);
        if let Some(LlmResponseFormat::Json) = request.constraints() {
            llm_request.response_format = LlmResponseFormat::Json;
        }

        Ok(llm_request)
    }
}
