//! In-process identity store.
//!
//! Used when `DATABASE_URL` is not configured and by tests. Data lives only as
//! long as the process.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{NewUser, UserRecord, UserRepo};

#[derive(Debug, Default)]
pub struct InMemoryUserRepo {
    // keyed by username
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> RepoResult<bool> {
        Ok(self.users.read().await.contains_key(username))
    }

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        Ok(self.users.read().await.values().any(|u| u.email == email))
    }

    async fn insert(&self, user: NewUser) -> RepoResult<UserRecord> {
        // Single write lock so the uniqueness checks and the insert are atomic.
        let mut users = self.users.write().await;

        if users.contains_key(&user.username) || users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
            created_at: Utc::now(),
        };
        users.insert(record.username.clone(), record.clone());

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::role::{Role, RoleSet};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
            roles: RoleSet::from([Role::User]),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = InMemoryUserRepo::new();
        let created = repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.roles, RoleSet::from([Role::User]));
        assert!(repo.exists_by_username("alice").await.unwrap());
        assert!(repo.exists_by_email("alice@example.com").await.unwrap());
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let repo = InMemoryUserRepo::new();
        repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let dup_name = repo.insert(new_user("alice", "other@example.com")).await;
        assert!(matches!(dup_name, Err(RepoError::Conflict)));

        let dup_email = repo.insert(new_user("bob", "alice@example.com")).await;
        assert!(matches!(dup_email, Err(RepoError::Conflict)));
    }
}
