//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! ([`EngineConfig`], [`Role`]) by the binary.

mod engine;
mod logging;
mod provider;
mod roles;

pub use engine::{FileConsensusConfig, FileEngineConfig, FileRetryConfig, FileSelectionConfig};
pub use logging::FileLoggingConfig;
pub use provider::FileProviderConfig;
pub use roles::{FileRoleConfig, default_cast};

use conclave_application::EngineConfig;
use conclave_domain::{Role, mention_key};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found by [`FileConfig::validate`]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub message: String,
}

impl ConfigIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub engine: FileEngineConfig,
    pub selection: FileSelectionConfig,
    pub consensus: FileConsensusConfig,
    pub retry: FileRetryConfig,
    pub provider: FileProviderConfig,
    pub logging: FileLoggingConfig,
    /// Static cast served by the role supplier
    pub roles: Vec<FileRoleConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            engine: FileEngineConfig::default(),
            selection: FileSelectionConfig::default(),
            consensus: FileConsensusConfig::default(),
            retry: FileRetryConfig::default(),
            provider: FileProviderConfig::default(),
            logging: FileLoggingConfig::default(),
            roles: default_cast(),
        }
    }
}

impl FileConfig {
    /// Build the turn loop parameters
    pub fn to_engine_config(&self) -> EngineConfig {
        let default_model = &self.provider.default_model;
        EngineConfig {
            max_turns: self.engine.max_turns,
            max_roles: self.engine.max_roles,
            context_window: self.engine.context_window,
            provider_timeout: Duration::from_secs(self.engine.provider_timeout_secs),
            generation_temperature: self.engine.temperature,
            max_response_tokens: self.engine.max_response_tokens,
            delivery_timeout: Duration::from_secs(self.engine.delivery_timeout_secs),
            selection: self.selection.to_selection_config(default_model),
            consensus: self.consensus.to_consensus_config(default_model),
            retry: self.retry.to_retry_policy(),
        }
    }

    /// The configured cast with models resolved
    pub fn cast(&self) -> Vec<Role> {
        self.roles
            .iter()
            .map(|r| r.to_role(&self.provider.default_model))
            .collect()
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.engine.max_turns == 0 {
            issues.push(ConfigIssue::error("engine.max_turns must be at least 1"));
        }
        if self.engine.max_roles < 2 {
            issues.push(ConfigIssue::error("engine.max_roles must be at least 2"));
        }
        if self.engine.context_window == 0 {
            issues.push(ConfigIssue::warning(
                "engine.context_window is 0, roles will not see the transcript",
            ));
        }
        if !(0.0..=1.0).contains(&self.consensus.threshold) {
            issues.push(ConfigIssue::error(format!(
                "consensus.threshold must be within [0, 1], got {}",
                self.consensus.threshold
            )));
        }
        if !self.consensus.weights.is_valid() {
            issues.push(ConfigIssue::error(
                "consensus.weights must be non-negative and sum to a positive value",
            ));
        }
        if self.retry.max_attempts == 0 {
            issues.push(ConfigIssue::warning(
                "retry.max_attempts is 0, each call is still attempted once",
            ));
        }
        if self.selection.model_assisted && self.selection.history_window == 0 {
            issues.push(ConfigIssue::warning(
                "selection.history_window is 0, the model hint sees no messages",
            ));
        }

        let mut seen = HashSet::new();
        for role in &self.roles {
            let key = mention_key(&role.name);
            if key.is_empty() {
                issues.push(ConfigIssue::error(format!(
                    "roles: '{}' has no letters or digits",
                    role.name
                )));
            } else if !seen.insert(key) {
                issues.push(ConfigIssue::error(format!(
                    "roles: duplicate role name '{}'",
                    role.name
                )));
            }
        }
        if self.roles.len() > self.engine.max_roles {
            issues.push(ConfigIssue::warning(format!(
                "roles: {} roles configured but engine.max_roles is {}",
                self.roles.len(),
                self.engine.max_roles
            )));
        }

        issues
    }
}
