//! Role supplier serving a fixed cast from configuration

use async_trait::async_trait;
use conclave_application::{RoleSupplier, RoleSupplierError};
use conclave_domain::Role;
use tracing::debug;

/// Serves the configured `[[roles]]` cast regardless of topic.
///
/// A request for `count` roles returns the first `count` configured roles.
pub struct StaticRoleSupplier {
    roles: Vec<Role>,
}

impl StaticRoleSupplier {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }

    pub fn available(&self) -> usize {
        self.roles.len()
    }
}

#[async_trait]
impl RoleSupplier for StaticRoleSupplier {
    async fn supply(&self, topic: &str, count: usize) -> Result<Vec<Role>, RoleSupplierError> {
        if count == 0 || count > self.roles.len() {
            return Err(RoleSupplierError::InsufficientRoles {
                requested: count,
                available: self.roles.len(),
            });
        }
        debug!(topic, count, "Supplying static cast");
        Ok(self.roles.iter().take(count).cloned().collect())
    }
}
