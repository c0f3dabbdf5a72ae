//! Per-discussion turn loop
//!
//! One task per started discussion. Every turn boundary checks, in order:
//! the stop token, the inbox of user messages, then runs one agent turn.
//! Each message and status change is persisted before it is broadcast.

use super::DiscussionHandle;
use crate::broadcast::BroadcastHub;
use crate::config::EngineConfig;
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use crate::ports::repository::{DiscussionRepository, DiscussionSnapshot, RepositoryError};
use crate::use_cases::consensus_detector::ConsensusDetector;
use crate::use_cases::retry::with_retry;
use crate::use_cases::speaker_selector::SpeakerSelector;
use conclave_domain::{
    Discussion, DiscussionEvent, DiscussionStatus, FailureClass, Message, PromptTemplate,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Why the loop ended
#[derive(Debug)]
enum Outcome {
    Stopped,
    Completed,
    Failed {
        turn: u32,
        class: FailureClass,
        error: String,
    },
}

impl Outcome {
    fn persistence(turn: u32, e: RepositoryError) -> Self {
        Outcome::Failed {
            turn,
            class: FailureClass::Persistence,
            error: e.to_string(),
        }
    }

    fn internal(turn: u32, error: impl ToString) -> Self {
        Outcome::Failed {
            turn,
            class: FailureClass::Internal,
            error: error.to_string(),
        }
    }

    fn status(&self) -> DiscussionStatus {
        match self {
            Outcome::Stopped => DiscussionStatus::Stopped,
            Outcome::Completed => DiscussionStatus::Completed,
            Outcome::Failed { .. } => DiscussionStatus::Failed,
        }
    }
}

pub(super) struct TurnLoop<G: LlmGateway + 'static> {
    pub(super) discussion: Discussion,
    pub(super) inbox: mpsc::UnboundedReceiver<String>,
    pub(super) handle: Arc<DiscussionHandle>,
    pub(super) gateway: Arc<G>,
    pub(super) repository: Arc<dyn DiscussionRepository>,
    pub(super) hub: Arc<BroadcastHub>,
    pub(super) selector: SpeakerSelector<G>,
    pub(super) detector: ConsensusDetector<G>,
    pub(super) config: EngineConfig,
}

impl<G: LlmGateway + 'static> TurnLoop<G> {
    pub(super) async fn run(mut self) {
        let outcome = self.drive().await;
        self.finish(outcome).await;
    }

    async fn drive(&mut self) -> Outcome {
        loop {
            if self.handle.stop.is_cancelled() {
                return Outcome::Stopped;
            }

            if let Ok(content) = self.inbox.try_recv() {
                if let Err(outcome) = self.append_user_message(content).await {
                    return outcome;
                }
                continue;
            }

            match self.agent_turn().await {
                Ok(true) => return Outcome::Completed,
                Ok(false) => {}
                Err(outcome) => return outcome,
            }
        }
    }

    async fn append_user_message(&mut self, content: String) -> Result<(), Outcome> {
        let turn = self.discussion.current_turn;
        let mut staged = self.discussion.clone();
        let message = match staged.append_user_message(content) {
            Ok(message) => message.clone(),
            Err(e) => {
                warn!(discussion = %self.discussion.id.short(), error = %e, "Injected message rejected");
                return Ok(());
            }
        };
        self.commit(staged, &message, turn).await?;

        debug!(discussion = %self.discussion.id.short(), turn, "User message appended");
        self.hub
            .emit(&DiscussionEvent::UserMessage {
                discussion_id: self.discussion.id,
                turn: message.turn,
                message,
            })
            .await;
        Ok(())
    }

    /// Run one agent turn. Returns whether the discussion is complete.
    async fn agent_turn(&mut self) -> Result<bool, Outcome> {
        let id = self.discussion.id;
        let turn = self.discussion.current_turn + 1;
        let previous = self.discussion.previous_speaker().map(|r| r.name.clone());

        let selection = self
            .selector
            .select(
                &self.discussion.topic,
                &self.discussion.messages,
                &self.discussion.roles,
                previous.as_deref(),
            )
            .await
            .ok_or_else(|| Outcome::internal(turn, "no role available to speak"))?;
        let role = selection.role;
        debug!(discussion = %id.short(), turn, role = %role.name, source = %selection.source, "Speaker selected");

        let request = CompletionRequest::new(
            role.model.clone(),
            role.system_prompt.clone(),
            PromptTemplate::turn_instruction(&self.discussion.topic, &role, &self.discussion.roles),
        )
        .with_topic(self.discussion.topic.clone())
        .with_window(
            self.discussion
                .trailing_window(self.config.context_window)
                .to_vec(),
            Some(role.name.clone()),
        )
        .with_temperature(self.config.generation_temperature)
        .with_max_tokens(self.config.max_response_tokens);

        let gateway = &self.gateway;
        let request = &request;
        let name = role.name.as_str();
        let reply = with_retry(
            &self.config.retry,
            self.config.provider_timeout,
            move |attempt| async move {
                debug!(turn, attempt, role = name, "Requesting generation");
                let text = gateway.complete(request).await?;
                let reply = strip_speaker_prefix(&text, name);
                if reply.is_empty() {
                    Err(GatewayError::EmptyResponse)
                } else {
                    Ok(reply.to_string())
                }
            },
        )
        .await
        .map_err(|e| Outcome::Failed {
            turn,
            class: e.failure_class(),
            error: e.to_string(),
        })?;

        let mut staged = self.discussion.clone();
        let message = staged
            .append_agent_message(&role.name, reply)
            .map_err(|e| Outcome::internal(turn, e))?
            .clone();
        self.commit(staged, &message, turn).await?;

        info!(discussion = %id.short(), turn, role = %role.name, "Agent message appended");
        self.hub
            .emit(&DiscussionEvent::AgentMessage {
                discussion_id: id,
                turn,
                message,
            })
            .await;

        let consensus = self
            .detector
            .evaluate(
                &self.discussion.topic,
                &self.discussion.roles,
                &self.discussion.messages,
                turn,
            )
            .await;
        let reached = consensus.reached;
        if consensus.stalemate && !reached {
            warn!(discussion = %id.short(), turn, recommendation = %consensus.recommendation, "Panel is repeating itself");
        }
        self.discussion.record_consensus(consensus.clone());
        self.save_snapshot(turn).await?;
        self.hub
            .emit(&DiscussionEvent::ConsensusUpdate {
                discussion_id: id,
                turn,
                consensus,
            })
            .await;

        if reached {
            info!(discussion = %id.short(), turn, "Consensus reached");
            return Ok(true);
        }
        if self.discussion.turns_exhausted() {
            info!(discussion = %id.short(), turn, "Turn budget exhausted without consensus");
            return Ok(true);
        }
        Ok(false)
    }

    /// Store `message`, then adopt `staged` as the live state.
    ///
    /// The in-memory discussion only advances once the message is stored,
    /// so a failed append leaves the turn counter where it was.
    async fn commit(
        &mut self,
        staged: Discussion,
        message: &Message,
        turn: u32,
    ) -> Result<(), Outcome> {
        self.repository
            .append_message(message)
            .await
            .map_err(|e| Outcome::persistence(turn, e))?;
        self.discussion = staged;
        self.save_snapshot(turn).await
    }

    async fn save_snapshot(&self, turn: u32) -> Result<(), Outcome> {
        self.repository
            .save_discussion(&DiscussionSnapshot::from(&self.discussion))
            .await
            .map_err(|e| Outcome::persistence(turn, e))
    }

    /// Apply the terminal transition and persist it, mark the handle
    /// finished, write the closing summary, announce it, then release anyone
    /// waiting on the status channel.
    async fn finish(mut self, outcome: Outcome) {
        let id = self.discussion.id;
        let status = outcome.status();

        self.inbox.close();
        let mut dropped = 0;
        while self.inbox.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!(discussion = %id.short(), dropped, "Discarding user messages queued after the last turn");
        }

        if let Err(e) = self.discussion.transition(status) {
            error!(discussion = %id.short(), error = %e, "Terminal transition rejected");
        }
        if let Err(e) = self
            .repository
            .save_discussion(&DiscussionSnapshot::from(&self.discussion))
            .await
        {
            error!(discussion = %id.short(), error = %e, "Failed to persist final status");
        }

        self.handle.mark_finished(status);

        let turns = self.discussion.current_turn;
        let event = match outcome {
            Outcome::Failed { turn, class, error } => {
                error!(discussion = %id.short(), turn, class = %class, error = %error, "Discussion failed");
                DiscussionEvent::DiscussionFailed {
                    discussion_id: id,
                    turn,
                    error_class: class,
                    error,
                }
            }
            Outcome::Stopped | Outcome::Completed => {
                let consensus = self.discussion.consensus.as_ref();
                let reached = consensus.is_some_and(|c| c.reached);
                let confidence = consensus.map(|c| c.confidence).unwrap_or(0.0);
                let generated = if self.discussion.agent_message_count() > 0 {
                    self.detector
                        .summarize(&self.discussion.topic, &self.discussion.messages, consensus)
                        .await
                } else {
                    None
                };
                let summary = match (generated, consensus.and_then(|c| c.summary.clone())) {
                    (Some(summary), _) => summary,
                    (None, Some(summary)) if reached => summary,
                    _ if status == DiscussionStatus::Stopped => {
                        PromptTemplate::stopped_summary(&self.discussion.topic, turns)
                    }
                    _ => PromptTemplate::unresolved_summary(&self.discussion.topic, confidence),
                };
                info!(discussion = %id.short(), %status, turns, reached, confidence, "Discussion finished");
                DiscussionEvent::DiscussionComplete {
                    discussion_id: id,
                    turn: turns,
                    status,
                    total_turns: turns,
                    consensus_reached: reached,
                    confidence,
                    summary,
                }
            }
        };
        self.hub.emit(&event).await;
        self.handle.publish_status(self.discussion.status);
    }
}

/// Drop a leading `Name:` or `[Name]:` that models sometimes echo
fn strip_speaker_prefix<'a>(text: &'a str, name: &str) -> &'a str {
    let trimmed = text.trim();
    for prefix in [format!("[{}]:", name), format!("{}:", name), format!("[{}]", name)] {
        if let Some(rest) = trimmed.strip_prefix(prefix.as_str()) {
            return rest.trim();
        }
    }
    trimmed
}
