use std::sync::Arc;
use uuid::Uuid;

use crate::{
    dtos::auth::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse},
    models::{normalize_email, User},
    services::{
        error::ServiceError,
        jwt::{JwtService, TokenKind},
        store::{StoreError, UserStore},
    },
    utils::{CredentialHasher, Password},
};

/// Registration, login and refresh.
///
/// Refresh tokens are not rotated: a refresh token stays usable until its
/// own expiry, however many times it is presented.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtService,
    hasher: CredentialHasher,
    /// Verified against when the email is unknown, so both login failures cost one hash.
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt: JwtService,
        hasher: CredentialHasher,
    ) -> Result<Self, anyhow::Error> {
        let dummy_hash = hasher
            .hash(&Password::new("knowbase-dummy-password".to_string()))?
            .into_string();

        Ok(Self {
            users,
            jwt,
            hasher,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    #[tracing::instrument(skip_all)]
    pub async fn register(&self, req: RegisterRequest) -> Result<TokenResponse, ServiceError> {
        let email = normalize_email(&req.email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::email_taken());
        }

        let password_hash = self.hash_password(Password::new(req.password)).await?;
        let user = User::new(email, password_hash, req.full_name);

        // The pre-check above can race; the store's unique index is authoritative.
        let user = self.users.insert(user).await.map_err(|e| match e {
            StoreError::UniqueViolation("email") => ServiceError::email_taken(),
            other => ServiceError::Store(other),
        })?;

        tracing::info!(user_id = %user.id, "User registered");

        self.token_response(user.id)
    }

    #[tracing::instrument(skip_all)]
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let email = normalize_email(&req.email);
        let user = self.users.find_by_email(&email).await?;

        let digest = match &user {
            Some(user) => user.hashed_password.clone(),
            None => self.dummy_hash.to_string(),
        };
        let password_ok = self.verify_password(Password::new(req.password), digest).await?;

        match user {
            Some(user) if password_ok && user.is_active => {
                tracing::info!(user_id = %user.id, "User logged in");
                self.token_response(user.id)
            }
            Some(user) => {
                tracing::warn!(
                    user_id = %user.id,
                    active = user.is_active,
                    "Login rejected"
                );
                Err(ServiceError::invalid_credentials())
            }
            None => {
                tracing::warn!("Login rejected: unknown email");
                Err(ServiceError::invalid_credentials())
            }
        }
    }

    /// Mint a new pair from a refresh token. The presented token is not consumed.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, req: RefreshRequest) -> Result<TokenResponse, ServiceError> {
        let claims = self.jwt.decode(&req.refresh_token).map_err(|e| {
            tracing::debug!(error = %e, "Refresh token rejected");
            ServiceError::invalid_refresh_token()
        })?;

        if claims.kind != TokenKind::Refresh {
            tracing::debug!(kind = ?claims.kind, "Wrong token kind presented to refresh");
            return Err(ServiceError::invalid_refresh_token());
        }

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| ServiceError::invalid_refresh_token())?;

        let user = match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active => user,
            _ => {
                tracing::warn!(%user_id, "Refresh rejected: user missing or inactive");
                return Err(ServiceError::invalid_refresh_token());
            }
        };

        self.token_response(user.id)
    }

    fn token_response(&self, user_id: Uuid) -> Result<TokenResponse, ServiceError> {
        let pair = self
            .jwt
            .issue_pair(user_id)
            .map_err(|e| ServiceError::Internal(e.into()))?;

        Ok(TokenResponse::bearer(
            pair.access_token,
            pair.refresh_token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    async fn hash_password(&self, password: Password) -> Result<String, ServiceError> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))??;
        Ok(hash.into_string())
    }

    async fn verify_password(
        &self,
        password: Password,
        digest: String,
    ) -> Result<bool, ServiceError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))
    }
}
