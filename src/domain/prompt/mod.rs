//! Prompt construction - per-action requests and configurable templates

mod request;
mod set;
mod template;

pub use request::{
    DEFAULT_DESCRIPTION_BUDGET, MISSING_FIELD, PromptKind, PromptRequest, PromptSubject,
    TRUNCATION_MARKER, truncate_description,
};
pub use set::{
    DEFAULT_PROFILE_PROMPT, DEFAULT_RECOMMENDATION_PROMPT, DEFAULT_VISION_PROMPT, PromptSet,
};
pub use template::{PromptTemplate, TemplateError};
