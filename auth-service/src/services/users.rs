use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    dtos::user::UpdateUserRequest,
    models::{normalize_email, User},
    services::{
        error::ServiceError,
        store::{StoreError, UserStore},
    },
};

/// Profile reads and self-service updates.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ServiceError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(ServiceError::user_not_found)
    }

    #[tracing::instrument(skip(self, req))]
    pub async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<User, ServiceError> {
        let mut user = self.get_user(id).await?;

        if let Some(email) = req.email {
            let email = normalize_email(&email);
            if email != user.email {
                if let Some(existing) = self.users.find_by_email(&email).await? {
                    if existing.id != user.id {
                        return Err(ServiceError::email_taken());
                    }
                }
                user.email = email;
            }
        }

        if let Some(full_name) = req.full_name {
            user.full_name = full_name;
        }

        user.updated_at = Utc::now();

        let user = self.users.update(user).await.map_err(|e| match e {
            StoreError::UniqueViolation("email") => ServiceError::email_taken(),
            other => ServiceError::Store(other),
        })?;

        tracing::info!(user_id = %user.id, "User profile updated");

        Ok(user)
    }
}
