//! Domain error types

use crate::discussion::DiscussionStatus;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("A discussion needs at least {min} roles, got {actual}")]
    TooFewRoles { min: usize, actual: usize },

    #[error("A discussion allows at most {max} roles, got {actual}")]
    TooManyRoles { max: usize, actual: usize },

    #[error("Duplicate role name: {0}")]
    DuplicateRole(String),

    #[error("Role name must not be empty")]
    EmptyRoleName,

    #[error("Reserved speaker name cannot be used as a role: {0}")]
    ReservedRoleName(String),

    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Max turns must be at least 1")]
    ZeroMaxTurns,

    #[error("Message content must not be empty")]
    EmptyMessage,

    #[error("Discussion is {0}, no further messages can be appended")]
    NotAcceptingMessages(DiscussionStatus),

    #[error("Turn limit of {0} reached")]
    TurnLimitReached(u32),

    #[error("Cannot move discussion from {from} to {to}")]
    InvalidTransition {
        from: DiscussionStatus,
        to: DiscussionStatus,
    },
}

impl DomainError {
    /// Check if this error concerns the cast of roles
    pub fn is_roster_error(&self) -> bool {
        matches!(
            self,
            DomainError::TooFewRoles { .. }
                | DomainError::TooManyRoles { .. }
                | DomainError::DuplicateRole(_)
                | DomainError::EmptyRoleName
                | DomainError::ReservedRoleName(_)
        )
    }
}
