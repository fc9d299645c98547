//! Strategy templates: the bandit's fixed action space.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in rhetorical strategies used when no template list is configured.
pub const DEFAULT_TEMPLATES: [&str; 6] = [
    "Be concise and focus on logical structure and evidence.",
    "Emphasize emotional appeal and human impact; be persuasive.",
    "Focus on counter-arguments and rebuttals; attack assumptions.",
    "Use analogies and examples to illustrate the point clearly.",
    "Provide legal/ethical reasoning and reference principles.",
    "Prioritize clarity and brevity with a strong summary.",
];

/// Configuration problems detected when the bandit is constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("template set is empty; at least one strategy template is required")]
    EmptyTemplates,

    #[error("epsilon {0} is outside [0, 1]")]
    InvalidEpsilon(f64),
}

/// Ordered, immutable list of strategy instructions.
///
/// Templates are addressed by position; the length is the size of the
/// bandit's action space. A set is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TemplateSet {
    templates: Vec<String>,
}

impl TemplateSet {
    /// Build a template set, rejecting an empty list.
    pub fn new<I, S>(templates: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let templates: Vec<String> = templates.into_iter().map(Into::into).collect();
        if templates.is_empty() {
            return Err(ConfigError::EmptyTemplates);
        }
        Ok(Self { templates })
    }

    /// Number of templates (arms).
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the set has no templates (never true for a constructed set).
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template text at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.templates.get(index).map(String::as_str)
    }

    /// Iterate `(index, text)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.as_str()))
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for TemplateSet {
    type Error = ConfigError;

    fn try_from(templates: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(templates)
    }
}

impl From<TemplateSet> for Vec<String> {
    fn from(set: TemplateSet) -> Self {
        set.templates
    }
}
