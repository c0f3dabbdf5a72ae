//! Speaker selection use case
//!
//! Layers the model-assisted hint over the deterministic rules in
//! [`conclave_domain::selection`]. The hint is best effort: any failure
//! (bad answer, provider error, timeout) falls through to round-robin and
//! is only logged.

use crate::config::SelectionConfig;
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use conclave_domain::{
    Message, PromptTemplate, Role, SelectionSource, mention_target, round_robin_after,
    validate_model_choice,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// The chosen speaker and the rule that chose it
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub role: Role,
    pub source: SelectionSource,
}

/// Reasons the model hint was discarded. Never surfaced to callers.
#[derive(Error, Debug)]
enum SelectionError {
    #[error("answer {0:?} does not name an eligible role")]
    InvalidAnswer(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("selection call timed out")]
    Timeout,
}

pub struct SpeakerSelector<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    config: SelectionConfig,
}

impl<G: LlmGateway + 'static> SpeakerSelector<G> {
    pub fn new(gateway: Arc<G>, config: SelectionConfig) -> Self {
        Self { gateway, config }
    }

    /// Pick the next speaker.
    ///
    /// Returns `None` only for an empty roster.
    pub async fn select(
        &self,
        topic: &str,
        history: &[Message],
        roles: &[Role],
        previous: Option<&str>,
    ) -> Option<Selection> {
        if let Some(role) = mention_target(history.last(), roles, previous) {
            debug!(role = %role.name, "Speaker chosen by mention");
            return Some(Selection {
                role: role.clone(),
                source: SelectionSource::Mention,
            });
        }

        if self.config.model_assisted && !history.is_empty() && roles.len() > 1 {
            match self.ask_model(topic, history, roles, previous).await {
                Ok(role) => {
                    debug!(role = %role.name, "Speaker chosen by model");
                    return Some(Selection {
                        role,
                        source: SelectionSource::Model,
                    });
                }
                Err(e) => info!(error = %e, "Model speaker hint discarded, using round-robin"),
            }
        }

        round_robin_after(roles, previous).map(|role| Selection {
            role: role.clone(),
            source: SelectionSource::RoundRobin,
        })
    }

    async fn ask_model(
        &self,
        topic: &str,
        history: &[Message],
        roles: &[Role],
        previous: Option<&str>,
    ) -> Result<Role, SelectionError> {
        let start = history.len().saturating_sub(self.config.history_window);
        let recent = &history[start..];

        let request = CompletionRequest::new(
            self.config.model.clone(),
            PromptTemplate::selection_system(),
            PromptTemplate::selection_prompt(topic, roles, recent, previous),
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(Some(20));

        let answer = tokio::time::timeout(self.config.timeout, self.gateway.complete(&request))
            .await
            .map_err(|_| SelectionError::Timeout)??;

        validate_model_choice(&answer, roles, previous)
            .cloned()
            .ok_or(SelectionError::InvalidAnswer(answer))
    }
}
