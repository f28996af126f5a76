use service_core::error::AppError;
use thiserror::Error;

use crate::services::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Bad credentials, bad token, unknown or inactive user. Never says which.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn invalid_credentials() -> Self {
        Self::Unauthorized("Incorrect email or password".to_string())
    }

    pub fn not_authenticated() -> Self {
        Self::Unauthorized("Could not validate credentials".to_string())
    }

    pub fn email_taken() -> Self {
        Self::Conflict("Email already registered".to_string())
    }

    pub fn invalid_refresh_token() -> Self {
        Self::BadRequest("Invalid refresh token".to_string())
    }

    pub fn not_a_member() -> Self {
        Self::Forbidden("Not a member of this organization".to_string())
    }

    pub fn insufficient_role() -> Self {
        Self::Forbidden("Insufficient role for this operation".to_string())
    }

    pub fn user_not_found() -> Self {
        Self::NotFound("User not found".to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized(msg) => AppError::Unauthorized(anyhow::anyhow!(msg)),
            ServiceError::Forbidden(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::BadRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            // A write that lost the race against the unique index.
            ServiceError::Store(StoreError::UniqueViolation("email")) => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::Store(StoreError::Database(e)) => AppError::DatabaseError(e.into()),
            ServiceError::Store(e) => AppError::InternalError(e.into()),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::http::StatusCode;

    #[test]
    fn test_status_table() {
        let cases = [
            (ServiceError::invalid_credentials(), StatusCode::UNAUTHORIZED),
            (ServiceError::not_a_member(), StatusCode::FORBIDDEN),
            (ServiceError::email_taken(), StatusCode::CONFLICT),
            (ServiceError::invalid_refresh_token(), StatusCode::BAD_REQUEST),
            (ServiceError::user_not_found(), StatusCode::NOT_FOUND),
            (
                ServiceError::Store(StoreError::UniqueViolation("email")),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Store(StoreError::UniqueViolation("membership")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let label = format!("{:?}", err);
            assert_eq!(AppError::from(err).status_code(), expected, "{}", label);
        }
    }
}
