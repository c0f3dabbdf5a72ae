//! Discussion aggregate

use super::mention::{extract_mentions, mention_key};
use super::message::{Message, Speaker};
use super::role::Role;
use crate::consensus::ConsensusResult;
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Minimum number of roles in any discussion
pub const MIN_ROLES: usize = 2;

/// Unique discussion identifier, generated at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscussionId(Uuid);

impl DiscussionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, for log lines
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for DiscussionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DiscussionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DiscussionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status of a discussion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionStatus {
    /// Cast fixed, no messages yet
    Created,
    /// Turn loop running
    Active,
    /// Halted by an explicit stop command
    Stopped,
    /// Ended by consensus or by exhausting the turn budget
    Completed,
    /// Ended by an unrecoverable error
    Failed,
}

impl DiscussionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscussionStatus::Created => "created",
            DiscussionStatus::Active => "active",
            DiscussionStatus::Stopped => "stopped",
            DiscussionStatus::Completed => "completed",
            DiscussionStatus::Failed => "failed",
        }
    }

    /// Terminal statuses never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DiscussionStatus::Stopped | DiscussionStatus::Completed | DiscussionStatus::Failed
        )
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: DiscussionStatus) -> bool {
        matches!(
            (self, next),
            (DiscussionStatus::Created, DiscussionStatus::Active)
                | (DiscussionStatus::Active, DiscussionStatus::Stopped)
                | (DiscussionStatus::Active, DiscussionStatus::Completed)
                | (DiscussionStatus::Active, DiscussionStatus::Failed)
        )
    }
}

impl std::fmt::Display for DiscussionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One run of the engine over a fixed topic and cast.
///
/// Turns are 1-indexed: `current_turn` counts completed agent turns, the
/// message produced by the next agent turn carries `current_turn + 1`.
/// Injected user messages carry the turn number of the last completed turn
/// and do not advance the counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    pub id: DiscussionId,
    pub topic: String,
    pub status: DiscussionStatus,
    pub roles: Vec<Role>,
    pub messages: Vec<Message>,
    pub current_turn: u32,
    pub max_turns: u32,
    /// Latest consensus evaluation (replaced after every agent turn)
    pub consensus: Option<ConsensusResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discussion {
    /// Create a discussion in `Created` status after validating the cast.
    pub fn new(
        topic: impl Into<String>,
        roles: Vec<Role>,
        max_turns: u32,
        max_roles: usize,
    ) -> Result<Self, DomainError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(DomainError::EmptyTopic);
        }
        if max_turns == 0 {
            return Err(DomainError::ZeroMaxTurns);
        }
        Self::validate_roles(&roles, max_roles)?;

        let now = Utc::now();
        Ok(Self {
            id: DiscussionId::new(),
            topic,
            status: DiscussionStatus::Created,
            roles,
            messages: Vec::new(),
            current_turn: 0,
            max_turns,
            consensus: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn validate_roles(roles: &[Role], max_roles: usize) -> Result<(), DomainError> {
        if roles.len() < MIN_ROLES {
            return Err(DomainError::TooFewRoles {
                min: MIN_ROLES,
                actual: roles.len(),
            });
        }
        if roles.len() > max_roles {
            return Err(DomainError::TooManyRoles {
                max: max_roles,
                actual: roles.len(),
            });
        }

        // Names are compared by mention key so every role stays addressable
        let mut seen = HashSet::new();
        for role in roles {
            let key = mention_key(&role.name);
            if key.is_empty() {
                return Err(DomainError::EmptyRoleName);
            }
            if key == Speaker::USER {
                return Err(DomainError::ReservedRoleName(role.name.clone()));
            }
            if !seen.insert(key) {
                return Err(DomainError::DuplicateRole(role.name.clone()));
            }
        }
        Ok(())
    }

    // ==================== Queries ====================

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }

    /// The role that authored the most recent agent message
    pub fn previous_speaker(&self) -> Option<&Role> {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.author_role())
            .and_then(|name| self.role(name))
    }

    /// Number of messages written by panel members
    pub fn agent_message_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.is_user()).count()
    }

    /// The last `n` messages, oldest first
    pub fn trailing_window(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn turns_exhausted(&self) -> bool {
        self.current_turn >= self.max_turns
    }

    pub fn consensus_reached(&self) -> bool {
        self.consensus.as_ref().is_some_and(|c| c.reached)
    }

    // ==================== Mutations ====================

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(&mut self, next: DiscussionStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Append a message generated by `role_name` for the next turn and
    /// advance the turn counter.
    pub fn append_agent_message(
        &mut self,
        role_name: &str,
        content: impl Into<String>,
    ) -> Result<&Message, DomainError> {
        self.ensure_accepting()?;
        if self.turns_exhausted() {
            return Err(DomainError::TurnLimitReached(self.max_turns));
        }
        let model = self.role(role_name).map(|r| r.model.clone());
        let turn = self.current_turn + 1;
        self.push(Speaker::Role(role_name.to_string()), model, content.into(), turn)?;
        self.current_turn = turn;
        Ok(self.last_message())
    }

    /// Append a message injected by the user. Does not consume a turn.
    pub fn append_user_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<&Message, DomainError> {
        self.ensure_accepting()?;
        let turn = self.current_turn;
        self.push(Speaker::User, None, content.into(), turn)?;
        Ok(self.last_message())
    }

    /// Replace the latest consensus evaluation
    pub fn record_consensus(&mut self, result: ConsensusResult) {
        self.consensus = Some(result);
        self.touch();
    }

    fn ensure_accepting(&self) -> Result<(), DomainError> {
        if self.status != DiscussionStatus::Active {
            return Err(DomainError::NotAcceptingMessages(self.status));
        }
        Ok(())
    }

    fn push(
        &mut self,
        speaker: Speaker,
        model: Option<String>,
        content: String,
        turn: u32,
    ) -> Result<(), DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        let mentions = extract_mentions(&content, &self.roles);
        self.messages.push(Message {
            id: self.messages.len() as u64 + 1,
            discussion_id: self.id,
            turn,
            speaker,
            model,
            content,
            mentions,
            created_at: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    fn last_message(&self) -> &Message {
        // push() always precedes this call
        &self.messages[self.messages.len() - 1]
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
