//! PostgreSQL store for users and memberships.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Membership, User};
use crate::services::store::{MembershipStore, StoreError, UserStore};

const USER_COLUMNS: &str =
    "id, email, hashed_password, full_name, is_active, is_superuser, created_at, updated_at";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a unique-index violation to `UniqueViolation(field)`.
fn map_write_error(err: sqlx::Error, field: &'static str) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::UniqueViolation(field)
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, hashed_password, full_name, is_active, is_superuser, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "email"))?;
        Ok(inserted)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: User) -> Result<User, StoreError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, full_name = $4, is_active = $5,
                is_superuser = $6, updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "email"))?;
        Ok(updated)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    #[instrument(skip(self))]
    async fn find(&self, user_id: Uuid, org_id: Uuid) -> Result<Option<Membership>, StoreError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, organization_id, role, created_at
            FROM memberships
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    #[instrument(skip(self, membership), fields(user_id = %membership.user_id, org_id = %membership.organization_id))]
    async fn insert(&self, membership: Membership) -> Result<Membership, StoreError> {
        let inserted = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (id, user_id, organization_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, organization_id, role, created_at
            "#,
        )
        .bind(membership.id)
        .bind(membership.user_id)
        .bind(membership.organization_id)
        .bind(membership.role)
        .bind(membership.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "membership"))?;
        Ok(inserted)
    }
}
