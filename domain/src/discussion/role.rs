//! Role value object

use serde::{Deserialize, Serialize};

/// A named participant bound to one model and one system prompt.
///
/// Roles are fixed before the first turn and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique name within a discussion (also the `@mention` target)
    pub name: String,
    /// Model identifier used for this role's generation calls
    pub model: String,
    /// Behavioral instructions
    pub system_prompt: String,
    /// Short topical description (expertise)
    #[serde(default)]
    pub description: String,
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
