use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Author of a message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// One part of a (possibly multimodal) message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Base64-encoded image carried inline with the request
    InlineImage { data: String, mime_type: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::InlineImage {
            data: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }
}

/// A message in a model conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub parts: Vec<ContentPart>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            parts: vec![ContentPart::text(content)],
        }
    }

    /// Instruction followed by an inline image, the order the vision prompt uses
    pub fn user_with_image(
        instruction: impl Into<String>,
        image: &[u8],
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::User,
            parts: vec![
                ContentPart::text(instruction),
                ContentPart::image(image, mime_type),
            ],
        }
    }

    /// Concatenated text of every text part
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::InlineImage { .. } => None,
            })
            .collect()
    }

    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, ContentPart::InlineImage { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.text(), "Hello");
        assert!(!msg.has_image());
    }

    #[test]
    fn test_image_part_is_base64() {
        let msg = Message::user_with_image("Who is this?", b"abc", "image/png");

        assert!(msg.has_image());
        assert_eq!(msg.text(), "Who is this?");
        assert_eq!(
            msg.parts[1],
            ContentPart::InlineImage {
                data: "YWJj".to_string(),
                mime_type: "image/png".to_string(),
            }
        );
    }
}
