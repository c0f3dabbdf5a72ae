//! Events fanned out to observers

use super::entities::{DiscussionId, DiscussionStatus};
use super::message::Message;
use crate::consensus::ConsensusResult;
use serde::{Deserialize, Serialize};

/// Error class carried by a `discussion_failed` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Transient provider failures persisted past the retry budget
    ProviderTransient,
    /// The provider rejected the request outright
    ProviderPermanent,
    /// The persistence collaborator refused a write
    Persistence,
    /// A broken engine invariant
    Internal,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::ProviderTransient => "provider_transient",
            FailureClass::ProviderPermanent => "provider_permanent",
            FailureClass::Persistence => "persistence",
            FailureClass::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An update emitted by the turn loop.
///
/// Serialized with a `type` tag (`agent_message`, `user_message`,
/// `consensus_update`, `discussion_complete`, `discussion_failed`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscussionEvent {
    AgentMessage {
        discussion_id: DiscussionId,
        turn: u32,
        message: Message,
    },
    UserMessage {
        discussion_id: DiscussionId,
        turn: u32,
        message: Message,
    },
    ConsensusUpdate {
        discussion_id: DiscussionId,
        turn: u32,
        consensus: ConsensusResult,
    },
    /// Emitted for both `Completed` and `Stopped` endings
    DiscussionComplete {
        discussion_id: DiscussionId,
        turn: u32,
        status: DiscussionStatus,
        total_turns: u32,
        consensus_reached: bool,
        confidence: f64,
        summary: String,
    },
    DiscussionFailed {
        discussion_id: DiscussionId,
        turn: u32,
        error_class: FailureClass,
        error: String,
    },
}

impl DiscussionEvent {
    pub fn discussion_id(&self) -> DiscussionId {
        match self {
            DiscussionEvent::AgentMessage { discussion_id, .. }
            | DiscussionEvent::UserMessage { discussion_id, .. }
            | DiscussionEvent::ConsensusUpdate { discussion_id, .. }
            | DiscussionEvent::DiscussionComplete { discussion_id, .. }
            | DiscussionEvent::DiscussionFailed { discussion_id, .. } => *discussion_id,
        }
    }

    pub fn turn(&self) -> u32 {
        match self {
            DiscussionEvent::AgentMessage { turn, .. }
            | DiscussionEvent::UserMessage { turn, .. }
            | DiscussionEvent::ConsensusUpdate { turn, .. }
            | DiscussionEvent::DiscussionComplete { turn, .. }
            | DiscussionEvent::DiscussionFailed { turn, .. } => *turn,
        }
    }

    /// Wire name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            DiscussionEvent::AgentMessage { .. } => "agent_message",
            DiscussionEvent::UserMessage { .. } => "user_message",
            DiscussionEvent::ConsensusUpdate { .. } => "consensus_update",
            DiscussionEvent::DiscussionComplete { .. } => "discussion_complete",
            DiscussionEvent::DiscussionFailed { .. } => "discussion_failed",
        }
    }

    /// Whether this event ends the stream for its discussion
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            DiscussionEvent::DiscussionComplete { .. } | DiscussionEvent::DiscussionFailed { .. }
        )
    }
}
