//! Turn loop configuration from TOML (`[engine]`, `[selection]`,
//! `[consensus]` and `[retry]` sections)
//!
//! Example configuration:
//!
//! ```toml
//! [engine]
//! max_turns = 12
//! context_window = 10
//!
//! [selection]
//! model_assisted = true
//! history_window = 6
//!
//! [consensus]
//! threshold = 0.8
//! window = 10
//! weights = { lexical = 0.3, similarity = 0.3, adjudicated = 0.4 }
//! final_summary = true
//!
//! [retry]
//! max_attempts = 3
//! initial_backoff_ms = 500
//! ```

use conclave_application::{ConsensusConfig, EngineConfig, RetryPolicy, SelectionConfig};
use conclave_domain::ConsensusWeights;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[engine]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Turn budget for a discussion when none is given
    pub max_turns: u32,
    /// Largest accepted cast
    pub max_roles: usize,
    /// Prior messages sent with each generation request
    pub context_window: usize,
    pub provider_timeout_secs: u64,
    pub temperature: f32,
    pub max_response_tokens: Option<u32>,
    /// Per-observer delivery timeout
    pub delivery_timeout_secs: u64,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            max_turns: defaults.max_turns,
            max_roles: defaults.max_roles,
            context_window: defaults.context_window,
            provider_timeout_secs: defaults.provider_timeout.as_secs(),
            temperature: defaults.generation_temperature,
            max_response_tokens: defaults.max_response_tokens,
            delivery_timeout_secs: defaults.delivery_timeout.as_secs(),
        }
    }
}

/// `[selection]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSelectionConfig {
    pub model_assisted: bool,
    /// Falls back to `provider.default_model`
    pub model: Option<String>,
    pub history_window: usize,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for FileSelectionConfig {
    fn default() -> Self {
        let defaults = SelectionConfig::default();
        Self {
            model_assisted: defaults.model_assisted,
            model: None,
            history_window: defaults.history_window,
            timeout_secs: defaults.timeout.as_secs(),
            temperature: defaults.temperature,
        }
    }
}

impl FileSelectionConfig {
    pub fn to_selection_config(&self, default_model: &str) -> SelectionConfig {
        SelectionConfig {
            model_assisted: self.model_assisted,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            history_window: self.history_window,
            timeout: Duration::from_secs(self.timeout_secs),
            temperature: self.temperature,
        }
    }
}

/// `[consensus]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    /// Adjudication model; falls back to `provider.default_model`
    pub model: Option<String>,
    pub threshold: f64,
    pub window: usize,
    pub weights: ConsensusWeights,
    pub timeout_secs: u64,
    /// Generate a closing summary with the adjudication model
    pub final_summary: bool,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        let defaults = ConsensusConfig::default();
        Self {
            model: None,
            threshold: defaults.threshold,
            window: defaults.window,
            weights: defaults.weights,
            timeout_secs: defaults.timeout.as_secs(),
            final_summary: defaults.final_summary,
        }
    }
}

impl FileConsensusConfig {
    pub fn to_consensus_config(&self, default_model: &str) -> ConsensusConfig {
        ConsensusConfig {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            threshold: self.threshold,
            window: self.window,
            weights: self.weights,
            timeout: Duration::from_secs(self.timeout_secs),
            final_summary: self.final_summary,
        }
    }
}

/// `[retry]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    /// Total attempts per provider call, including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            max_attempts: defaults.max_attempts,
            initial_backoff_ms: defaults.initial_backoff.as_millis() as u64,
            max_backoff_ms: defaults.max_backoff.as_millis() as u64,
            multiplier: defaults.multiplier,
        }
    }
}

impl FileRetryConfig {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.multiplier,
        }
    }
}
