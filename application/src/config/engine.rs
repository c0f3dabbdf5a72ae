//! Engine parameters for the turn loop
//!
//! [`EngineConfig`] groups the static parameters that control
//! [`DiscussionOrchestrator`](crate::use_cases::orchestrator::DiscussionOrchestrator).
//! Values come from the `[engine]`, `[selection]`, `[consensus]` and
//! `[retry]` sections of the configuration file.

use super::retry::RetryPolicy;
use conclave_domain::ConsensusWeights;
use std::time::Duration;

/// Speaker selection parameters.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Ask a model for a hint before falling back to round-robin
    pub model_assisted: bool,
    /// Model used for the hint
    pub model: String,
    /// Number of trailing messages shown to the model (K)
    pub history_window: usize,
    /// Timeout for the hint call
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            model_assisted: true,
            model: "openai/gpt-4o-mini".to_string(),
            history_window: 6,
            timeout: Duration::from_secs(20),
            temperature: 0.5,
        }
    }
}

/// Consensus detection parameters.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Model used for the adjudication call
    pub model: String,
    /// Confidence at or above which consensus is reached
    pub threshold: f64,
    /// Trailing window (W); raised to the number of roles if smaller
    pub window: usize,
    pub weights: ConsensusWeights,
    /// Timeout for the adjudication and closing summary calls
    pub timeout: Duration,
    /// Ask the model for a closing summary when a discussion ends
    pub final_summary: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            threshold: 0.75,
            window: 10,
            weights: ConsensusWeights::default(),
            timeout: Duration::from_secs(30),
            final_summary: true,
        }
    }
}

/// Turn loop control parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default turn budget when `create` does not override it
    pub max_turns: u32,
    /// Maximum cast size
    pub max_roles: usize,
    /// Trailing messages included in each generation request
    pub context_window: usize,
    /// Timeout for each generation call attempt
    pub provider_timeout: Duration,
    pub generation_temperature: f32,
    pub max_response_tokens: Option<u32>,
    /// Timeout for delivering one event to one observer
    pub delivery_timeout: Duration,
    pub selection: SelectionConfig,
    pub consensus: ConsensusConfig,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            max_roles: 8,
            context_window: 12,
            provider_timeout: Duration::from_secs(60),
            generation_temperature: 0.7,
            max_response_tokens: Some(500),
            delivery_timeout: Duration::from_secs(5),
            selection: SelectionConfig::default(),
            consensus: ConsensusConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_max_roles(mut self, max: usize) -> Self {
        self.max_roles = max;
        self
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_consensus(mut self, consensus: ConsensusConfig) -> Self {
        self.consensus = consensus;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Disable the model hint so speaker order is fully deterministic
    pub fn without_model_selection(mut self) -> Self {
        self.selection.model_assisted = false;
        self
    }
}
