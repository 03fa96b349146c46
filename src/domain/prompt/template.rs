//! Prompt template parsing and rendering
//!
//! Supports variable syntax: `${var:variable_name:default-value}`
//! - `${var:name}` - Required variable, error if not provided
//! - `${var:name:default}` - Optional variable with default value

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{var:([a-zA-Z0-9][-_a-zA-Z0-9]*)(?::([^}]*))?\}")
        .expect("variable pattern is a valid regex")
});

/// Template processing errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Missing required variable: {name}")]
    MissingVariable { name: String },

    #[error("Template declares no variable named '{name}'")]
    UnexpectedVariable { name: String },
}

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    content: String,
    /// Names in order of first appearance
    variables: Vec<String>,
    required: HashSet<String>,
}

impl PromptTemplate {
    pub fn parse(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut variables = Vec::new();
        let mut required = HashSet::new();

        for cap in VARIABLE_PATTERN.captures_iter(&content) {
            let name = cap[1].to_string();

            if cap.get(2).is_none() {
                required.insert(name.clone());
            }
            if !variables.contains(&name) {
                variables.push(name);
            }
        }

        Self {
            content,
            variables,
            required,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Fails unless every name in `names` is declared by the template
    pub fn expect_variables(&self, names: &[&str]) -> Result<(), TemplateError> {
        match self.variables.iter().find(|v| !names.contains(&v.as_str())) {
            Some(name) => Err(TemplateError::UnexpectedVariable { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// Substitutes every variable occurrence in a single pass
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(self.content.len());
        let mut last = 0;

        for cap in VARIABLE_PATTERN.captures_iter(&self.content) {
            let whole = cap.get(0).expect("capture 0 is always present");
            let name = &cap[1];

            let value = match (values.get(name), cap.get(2)) {
                (Some(v), _) => v.as_str(),
                (None, Some(default)) => default.as_str(),
                (None, None) => {
                    return Err(TemplateError::MissingVariable {
                        name: name.to_string(),
                    });
                }
            };

            output.push_str(&self.content[last..whole.start()]);
            output.push_str(value);
            last = whole.end();
        }

        output.push_str(&self.content[last..]);
        Ok(output)
    }
}
