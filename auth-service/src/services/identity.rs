//! Bearer token to active user resolution.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::User;
use crate::services::{
    error::ServiceError,
    jwt::{JwtService, TokenKind},
    store::UserStore,
};

/// Resolves an access token to the active user it was issued for.
///
/// Every rejection is the same `Unauthorized`; the cause only goes to the log.
#[derive(Clone)]
pub struct IdentityResolver {
    jwt: JwtService,
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(jwt: JwtService, users: Arc<dyn UserStore>) -> Self {
        Self { jwt, users }
    }

    #[tracing::instrument(skip_all)]
    pub async fn resolve(&self, token: &str) -> Result<User, ServiceError> {
        let claims = self.jwt.decode(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            ServiceError::not_authenticated()
        })?;

        if claims.kind != TokenKind::Access {
            tracing::debug!(kind = ?claims.kind, "Non-access token presented as bearer");
            return Err(ServiceError::not_authenticated());
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            tracing::debug!("Token subject is not a user id");
            ServiceError::not_authenticated()
        })?;

        // Store failures propagate as 500: never authenticate on an unanswered lookup.
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(%user_id, "Token subject no longer exists");
                ServiceError::not_authenticated()
            })?;

        if !user.is_active {
            tracing::debug!(%user_id, "Token subject is deactivated");
            return Err(ServiceError::not_authenticated());
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::memory::MemoryStore;
    use crate::services::store::StoreError;
    use async_trait::async_trait;
    use chrono::Duration;

    fn jwt() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "identity-test-secret-0123456789abcdef".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expiry_minutes: 30,
            refresh_token_expiry_days: 7,
            leeway_seconds: 0,
        })
        .unwrap()
    }

    async fn setup() -> (IdentityResolver, MemoryStore, User) {
        let store = MemoryStore::new();
        let user = User::new(
            "alice@example.com".to_string(),
            "hash".to_string(),
            "Alice".to_string(),
        );
        let user = UserStore::insert(&store, user).await.unwrap();
        let resolver = IdentityResolver::new(jwt(), Arc::new(store.clone()));
        (resolver, store, user)
    }

    fn assert_unauthorized(result: Result<User, ServiceError>) {
        assert!(
            matches!(result, Err(ServiceError::Unauthorized(ref msg)) if msg == "Could not validate credentials"),
            "expected collapsed 401, got {:?}",
            result.map(|u| u.id)
        );
    }

    #[tokio::test]
    async fn test_resolves_active_user() {
        let (resolver, _, user) = setup().await;
        let token = jwt().issue_access(user.id).unwrap();

        let resolved = resolver.resolve(&token).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_a_bearer() {
        let (resolver, _, user) = setup().await;
        let token = jwt().issue_refresh(user.id).unwrap();

        assert_unauthorized(resolver.resolve(&token).await);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (resolver, _, user) = setup().await;
        let token = jwt()
            .issue(user.id, TokenKind::Access, Duration::seconds(-60))
            .unwrap();

        assert_unauthorized(resolver.resolve(&token).await);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_users_look_the_same() {
        let (resolver, store, mut user) = setup().await;

        let ghost = jwt().issue_access(Uuid::new_v4()).unwrap();
        assert_unauthorized(resolver.resolve(&ghost).await);

        user.is_active = false;
        store.update(user.clone()).await.unwrap();
        let token = jwt().issue_access(user.id).unwrap();
        assert_unauthorized(resolver.resolve(&token).await);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (resolver, _, _) = setup().await;
        assert_unauthorized(resolver.resolve("not.a.token").await);
    }

    struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
            Err(StoreError::Internal(anyhow::anyhow!("connection refused")))
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Internal(anyhow::anyhow!("connection refused")))
        }
        async fn insert(&self, _user: User) -> Result<User, StoreError> {
            Err(StoreError::Internal(anyhow::anyhow!("connection refused")))
        }
        async fn update(&self, _user: User) -> Result<User, StoreError> {
            Err(StoreError::Internal(anyhow::anyhow!("connection refused")))
        }
        async fn health_check(&self) -> Result<(), StoreError> {
            Err(StoreError::Internal(anyhow::anyhow!("connection refused")))
        }
    }

    #[tokio::test]
    async fn test_store_failure_does_not_authenticate() {
        let resolver = IdentityResolver::new(jwt(), Arc::new(FailingStore));
        let token = jwt().issue_access(Uuid::new_v4()).unwrap();

        assert!(matches!(
            resolver.resolve(&token).await,
            Err(ServiceError::Store(_))
        ));
    }
}
