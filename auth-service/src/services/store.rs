//! Persistence collaborators consumed by the auth core.
//!
//! Implementations own their own connection pooling; each call is atomic
//! from the caller's point of view.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Membership, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries the field name.
    #[error("Unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// User lookup and persistence.
///
/// Emails passed in are already normalised; implementations must still
/// enforce email uniqueness themselves.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn update(&self, user: User) -> Result<User, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Tenant membership lookup.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find(&self, user_id: Uuid, org_id: Uuid) -> Result<Option<Membership>, StoreError>;

    async fn insert(&self, membership: Membership) -> Result<Membership, StoreError>;
}
