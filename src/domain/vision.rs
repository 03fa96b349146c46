//! Image-based character identification outcomes

use serde::{Deserialize, Serialize};

/// Sentinel label callers branch on before looking a character up
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Detailed result of a classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum VisionOutcome {
    /// The model named a character
    Recognized(String),
    /// The model answered but did not recognise the subject
    Unrecognized,
    /// The request itself failed
    Failed(String),
}

impl VisionOutcome {
    /// Interprets the raw model answer
    pub fn from_answer(answer: &str) -> Self {
        let label = normalize_label(answer);

        if label.is_empty() || label.eq_ignore_ascii_case(UNKNOWN_LABEL) {
            Self::Unrecognized
        } else {
            Self::Recognized(label)
        }
    }

    /// Collapses to the sentinel contract: a name or exactly `"Unknown"`
    pub fn into_label(self) -> String {
        match self {
            Self::Recognized(name) => name,
            Self::Unrecognized | Self::Failed(_) => UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Recognized(name) => Some(name),
            _ => None,
        }
    }
}

/// Trims whitespace, quotes and a trailing period from a short label
pub fn normalize_label(answer: &str) -> String {
    let first_line = answer.trim().lines().next().unwrap_or("");

    first_line
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '*' || c == '`')
        .trim_end_matches('.')
        .trim()
        .to_string()
}

/// MIME type from an image's magic bytes
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_answer() {
        let outcome = VisionOutcome::from_answer("  \"Monkey D. Luffy\"\n");
        assert_eq!(outcome, VisionOutcome::Recognized("Monkey D. Luffy".to_string()));
        assert_eq!(outcome.into_label(), "Monkey D. Luffy");
    }

    #[test]
    fn test_unknown_answer_variants() {
        assert_eq!(VisionOutcome::from_answer("Unknown"), VisionOutcome::Unrecognized);
        assert_eq!(VisionOutcome::from_answer("unknown."), VisionOutcome::Unrecognized);
        assert_eq!(VisionOutcome::from_answer("   "), VisionOutcome::Unrecognized);
    }

    #[test]
    fn test_failed_collapses_to_sentinel() {
        let outcome = VisionOutcome::Failed("timeout".to_string());
        assert_eq!(outcome.into_label(), UNKNOWN_LABEL);
    }

    #[test]
    fn test_sniff_mime_type() {
        assert_eq!(sniff_mime_type(&[0x89, b'P', b'N', b'G', 0x0D]), "image/png");
        assert_eq!(sniff_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime_type(b"GIF89a"), "image/gif");
        assert_eq!(sniff_mime_type(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime_type(b"??"), "image/jpeg");
    }
}
