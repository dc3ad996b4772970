/*
 * Responsibility
 * - 認証済み主体 (Identity) の型
 * - token の subject → identity store → Identity への射影 (IdentityResolver)
 *
 * Notes
 * - resolve できたこと自体は「認証済み」を意味しない (署名/期限は TokenCodec の責務)
 */
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::repos::user_repo::{UserRecord, UserRepo};
use crate::services::auth::role::{Role, RoleSet};

/// Principal attached to a single request after successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub roles: RoleSet,
}

impl Identity {
    pub fn new(subject: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &RoleSet) -> bool {
        !self.roles.is_disjoint(roles)
    }
}

impl From<UserRecord> for Identity {
    // Drops id/email/password_hash.
    fn from(record: UserRecord) -> Self {
        Self {
            subject: record.username,
            roles: record.roles,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("subject not found")]
    SubjectNotFound,
    #[error("identity store error: {0}")]
    Store(#[from] RepoError),
}

#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepo>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("backend", &self.users.backend_name())
            .finish()
    }
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    pub async fn resolve(&self, subject: &str) -> Result<Identity, ResolveError> {
        self.users
            .find_by_username(subject)
            .await?
            .map(Identity::from)
            .ok_or(ResolveError::SubjectNotFound)
    }
}
