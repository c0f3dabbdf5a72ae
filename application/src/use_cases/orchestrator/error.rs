use crate::ports::repository::RepositoryError;
use crate::ports::role_supplier::RoleSupplierError;
use conclave_domain::{DiscussionId, DiscussionStatus, DomainError};
use thiserror::Error;

/// Failures of public orchestrator operations.
///
/// None of these change the state of the discussion they refer to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscussionError {
    #[error("Discussion not found: {0}")]
    NotFound(DiscussionId),

    #[error("Cannot {operation} a discussion in status {status}")]
    InvalidStateTransition {
        status: DiscussionStatus,
        operation: &'static str,
    },

    #[error("Discussion {id} already finished with status {status}")]
    AlreadyFinished {
        id: DiscussionId,
        status: DiscussionStatus,
    },

    #[error("Invalid discussion: {0}")]
    InvalidRoster(#[from] DomainError),

    #[error("No role supplier configured")]
    NoRoleSupplier,

    #[error("Persistence error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Role supplier error: {0}")]
    RoleSupplier(#[from] RoleSupplierError),
}

impl DiscussionError {
    pub fn is_already_finished(&self) -> bool {
        matches!(self, DiscussionError::AlreadyFinished { .. })
    }
}
