//! Tenant membership and role checks.

use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Membership, Role, User};
use crate::services::{error::ServiceError, store::MembershipStore};

/// The set of roles allowed to reach an operation.
///
/// Built once per route when the router is assembled. There is no role
/// hierarchy: a route open to admins and owners must name both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequirement {
    allowed: BTreeSet<Role>,
}

impl RoleRequirement {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.allowed.iter().copied()
    }
}

/// Membership/role gate for tenant-scoped operations. Read-only.
#[derive(Clone)]
pub struct MembershipGate {
    memberships: Arc<dyn MembershipStore>,
}

impl MembershipGate {
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    /// The caller's membership in `org_id`, or `Forbidden`.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn require_membership(
        &self,
        user: &User,
        org_id: Uuid,
    ) -> Result<Membership, ServiceError> {
        self.memberships
            .find(user.id, org_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Access denied: no membership");
                ServiceError::not_a_member()
            })
    }

    /// As `require_membership`, and the role must be in `requirement`.
    #[tracing::instrument(skip(self, user, requirement), fields(user_id = %user.id))]
    pub async fn require_role(
        &self,
        user: &User,
        org_id: Uuid,
        requirement: &RoleRequirement,
    ) -> Result<Membership, ServiceError> {
        let membership = self.require_membership(user, org_id).await?;

        if !requirement.allows(membership.role) {
            tracing::warn!(
                role = %membership.role,
                allowed = ?requirement.roles().collect::<Vec<_>>(),
                "Access denied: role not allowed"
            );
            return Err(ServiceError::insufficient_role());
        }

        Ok(membership)
    }
}
