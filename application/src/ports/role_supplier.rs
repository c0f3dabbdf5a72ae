//! Role supplier port
//!
//! Produces the cast for a discussion before it is created.

use async_trait::async_trait;
use conclave_domain::Role;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleSupplierError {
    #[error("Requested {requested} roles but only {available} are available")]
    InsufficientRoles { requested: usize, available: usize },

    #[error("Role supplier unavailable: {0}")]
    Unavailable(String),
}

/// Source of Role records for a topic.
///
/// Implementations return an ordered, non-empty list with unique names.
/// The orchestrator still validates the cast before creating a discussion.
#[async_trait]
pub trait RoleSupplier: Send + Sync {
    async fn supply(&self, topic: &str, count: usize) -> Result<Vec<Role>, RoleSupplierError>;
}
