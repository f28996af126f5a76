use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;

/// Which operation a token may be presented to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Authenticates API calls.
    Access,
    /// Only mints new token pairs.
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token ID
    pub jti: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, wrong algorithm or expired.
    #[error("Invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
}

/// Access + refresh token pair minted for one subject.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Stateless token codec: HMAC-signed JWTs with a single shared secret.
///
/// Nothing is persisted; a token's lifetime is exactly its signature's
/// validity window.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
    leeway_seconds: u64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, AppError> {
        let algorithm = config.signing_algorithm()?;

        tracing::info!(algorithm = ?algorithm, "JWT service initialized");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm,
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
            leeway_seconds: config.leeway_seconds,
        })
    }

    /// Sign a token of `kind` for `user_id` expiring `ttl` from now.
    pub fn issue(&self, user_id: Uuid, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now + ttl;

        let claims = TokenClaims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            kind,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Generate an access token for a user
    pub fn issue_access(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(
            user_id,
            TokenKind::Access,
            Duration::minutes(self.access_token_expiry_minutes),
        )
    }

    /// Generate a refresh token for a user
    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(
            user_id,
            TokenKind::Refresh,
            Duration::days(self.refresh_token_expiry_days),
        )
    }

    /// Generate both access and refresh tokens
    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(user_id)?,
            refresh_token: self.issue_refresh(user_id)?,
        })
    }

    /// Verify signature and expiry and return the claims.
    ///
    /// The caller is responsible for checking `kind` against the operation.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        // jsonwebtoken defaults to 60s; skew tolerance is opt-in here.
        validation.leeway = self.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::Invalid)?;

        Ok(token_data.claims)
    }

    /// Get access token expiry in seconds (for client info)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }
}
