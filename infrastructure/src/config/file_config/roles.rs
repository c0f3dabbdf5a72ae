//! Static cast from TOML (`[[roles]]` array)
//!
//! ```toml
//! [[roles]]
//! name = "Economist"
//! model = "openai/gpt-4o"
//! description = "Markets, incentives and costs"
//! system_prompt = "You are an economist on a policy panel..."
//! ```

use conclave_domain::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRoleConfig {
    pub name: String,
    /// Falls back to `provider.default_model`
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl FileRoleConfig {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            model: None,
            description: description.to_string(),
            system_prompt: None,
        }
    }

    pub fn to_role(&self, default_model: &str) -> Role {
        let system_prompt = self.system_prompt.clone().unwrap_or_else(|| {
            format!(
                "You are {}, a panelist in a moderated expert discussion. Your perspective: {}. \
                 Argue from that perspective, engage with the other panelists by name, \
                 and concede points when you are persuaded.",
                self.name,
                if self.description.is_empty() {
                    "your own expertise"
                } else {
                    &self.description
                }
            )
        });
        Role::new(
            self.name.clone(),
            self.model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            system_prompt,
        )
        .with_description(self.description.clone())
    }
}

/// Cast used when the configuration names none
pub fn default_cast() -> Vec<FileRoleConfig> {
    vec![
        FileRoleConfig::new("Economist", "costs, incentives and market effects"),
        FileRoleConfig::new("Engineer", "technical feasibility and implementation risk"),
        FileRoleConfig::new("Ethicist", "fairness, rights and long-term social impact"),
        FileRoleConfig::new("Skeptic", "weak evidence, hidden assumptions and failure modes"),
    ]
}
