//! In-process store backed by `DashMap`, for tests and database-less runs.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Membership, User};
use crate::services::store::{MembershipStore, StoreError, UserStore};

#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<Uuid, User>>,
    /// Normalised email -> user id. Guards uniqueness.
    emails: Arc<DashMap<String, Uuid>>,
    memberships: Arc<DashMap<(Uuid, Uuid), Membership>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(StoreError::UniqueViolation("email")),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let previous_email = self
            .users
            .get(&user.id)
            .map(|u| u.email.clone())
            .ok_or_else(|| StoreError::Internal(anyhow::anyhow!("User {} not found", user.id)))?;

        if previous_email != user.email {
            match self.emails.entry(user.email.clone()) {
                Entry::Occupied(_) => return Err(StoreError::UniqueViolation("email")),
                Entry::Vacant(slot) => {
                    slot.insert(user.id);
                }
            }
            self.emails.remove(&previous_email);
        }

        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn find(&self, user_id: Uuid, org_id: Uuid) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .memberships
            .get(&(user_id, org_id))
            .map(|m| m.value().clone()))
    }

    async fn insert(&self, membership: Membership) -> Result<Membership, StoreError> {
        match self
            .memberships
            .entry((membership.user_id, membership.organization_id))
        {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation("membership")),
            Entry::Vacant(slot) => {
                slot.insert(membership.clone());
                Ok(membership)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(email: &str) -> User {
        User::new(email.to_string(), "hash".to_string(), "Test".to_string())
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = MemoryStore::new();
        let alice = UserStore::insert(&store, user("alice@example.com")).await.unwrap();

        let by_id = store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");

        let by_email = store.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, alice.id);

        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        UserStore::insert(&store, user("alice@example.com")).await.unwrap();

        let err = UserStore::insert(&store, user("ALICE@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation("email")));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_update_moves_email_index() {
        let store = MemoryStore::new();
        let mut alice = UserStore::insert(&store, user("alice@example.com")).await.unwrap();
        UserStore::insert(&store, user("bob@example.com")).await.unwrap();

        alice.email = "bob@example.com".to_string();
        let err = store.update(alice.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation("email")));

        alice.email = "alice@new.example.com".to_string();
        store.update(alice.clone()).await.unwrap();
        assert!(store.find_by_email("alice@example.com").await.unwrap().is_none());
        assert_eq!(
            store.find_by_email("alice@new.example.com").await.unwrap().unwrap().id,
            alice.id
        );
    }

    #[tokio::test]
    async fn test_one_membership_per_user_and_org() {
        let store = MemoryStore::new();
        let (user_id, org_id) = (Uuid::new_v4(), Uuid::new_v4());

        MembershipStore::insert(&store, Membership::new(user_id, org_id, Role::Member))
            .await
            .unwrap();
        let err = MembershipStore::insert(&store, Membership::new(user_id, org_id, Role::Owner))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation("membership")));

        let found = store.find(user_id, org_id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Member);
        assert!(store.find(user_id, Uuid::new_v4()).await.unwrap().is_none());
    }
}
