use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewUser, UserRecord, UserRepo};
use crate::services::auth::password;
use crate::services::auth::role::{Role, RoleSet};
use crate::services::auth::token::TokenCodec;

const DUMMY_PASSWORD: &str = "not-a-real-password";

/// Registration and login. Sits on top of the identity store and the token codec.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepo>,
    tokens: Arc<TokenCodec>,
    bcrypt_cost: u32,
    // checked when the username is unknown, so both login failures pay one bcrypt verify
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("backend", &self.users.backend_name())
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Service-level login result; handlers map it into the response DTO.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl AccountService {
    /// Hashes a throwaway password at `bcrypt_cost`; fails only if the cost is out of range.
    pub fn new(
        users: Arc<dyn UserRepo>,
        tokens: Arc<TokenCodec>,
        bcrypt_cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        let dummy_hash = password::hash(DUMMY_PASSWORD, bcrypt_cost)?;

        Ok(Self {
            users,
            tokens,
            bcrypt_cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Create a user. An empty `roles` set defaults to `{USER}`.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        plaintext: &str,
        roles: RoleSet,
    ) -> Result<UserRecord, AppError> {
        if self.users.exists_by_username(username).await? {
            return Err(AppError::conflict("Username is already taken!"));
        }
        if self.users.exists_by_email(email).await? {
            return Err(AppError::conflict("Email is already in use!"));
        }

        let roles = if roles.is_empty() {
            RoleSet::from([Role::User])
        } else {
            roles
        };

        let plaintext = plaintext.to_string();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || password::hash(&plaintext, cost))
            .await
            .map_err(|e| {
                error!(error = %e, "password hashing task failed");
                AppError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, "failed to hash password");
                AppError::Internal
            })?;

        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                roles,
            })
            .await
            .map_err(|e| match e {
                // lost a race against a concurrent signup
                RepoError::Conflict => AppError::conflict("Username or email is already in use!"),
                other => other.into(),
            })?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// Unknown user and wrong password are the same `Unauthorized`.
    pub async fn login(&self, username: &str, plaintext: &str) -> Result<IssuedToken, AppError> {
        let user = self.users.find_by_username(username).await?;

        let hashed = self.hash_to_check(user.as_ref()).to_string();
        let plaintext = plaintext.to_string();
        let matched = tokio::task::spawn_blocking(move || password::verify(&plaintext, &hashed))
            .await
            .map_err(|e| {
                error!(error = %e, "password verification task failed");
                AppError::Internal
            })?;

        let user = match user {
            Some(user) if matched => user,
            Some(user) => {
                debug!(user_id = %user.id, "login with wrong password");
                return Err(AppError::Unauthorized);
            }
            None => {
                debug!("login for unknown user");
                return Err(AppError::Unauthorized);
            }
        };

        let token = self
            .tokens
            .issue(&user.username)
            .map_err(|_| AppError::Internal)?;
        let expires_at = self
            .tokens
            .expiry_of(&token)
            .map_err(|_| AppError::Internal)?;

        info!(user_id = %user.id, "token issued");
        Ok(IssuedToken {
            token,
            username: user.username,
            expires_at,
        })
    }

    /// The stored hash, or the dummy one when there is no such user.
    fn hash_to_check<'a>(&'a self, user: Option<&'a UserRecord>) -> &'a str {
        match user {
            Some(user) => user.password_hash.as_str(),
            None => &*self.dummy_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory_user_repo::InMemoryUserRepo;

    fn service() -> (AccountService, Arc<TokenCodec>) {
        let tokens = Arc::new(TokenCodec::new(b"account-service-test-secret-0123456789", 600));
        let service = AccountService::new(
            Arc::new(InMemoryUserRepo::new()),
            tokens.clone(),
            password::MIN_COST,
        )
        .unwrap();
        (service, tokens)
    }

    #[tokio::test]
    async fn register_defaults_to_user_role_and_hashes_password() {
        let (service, _) = service();

        let user = service
            .register("alice", "alice@example.com", "pw-alice", RoleSet::new())
            .await
            .unwrap();

        assert_eq!(user.roles, RoleSet::from([Role::User]));
        assert_ne!(user.password_hash, "pw-alice");
        assert!(password::verify("pw-alice", &user.password_hash));
    }

    #[tokio::test]
    async fn register_keeps_requested_roles() {
        let (service, _) = service();

        let user = service
            .register(
                "mod",
                "mod@example.com",
                "pw",
                RoleSet::from([Role::Moderator]),
            )
            .await
            .unwrap();

        assert_eq!(user.roles, RoleSet::from([Role::Moderator]));
    }

    #[tokio::test]
    async fn duplicate_username_and_email_conflict() {
        let (service, _) = service();
        service
            .register("alice", "alice@example.com", "pw", RoleSet::new())
            .await
            .unwrap();

        let err = service
            .register("alice", "other@example.com", "pw", RoleSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Username is already taken!"));

        let err = service
            .register("bob", "alice@example.com", "pw", RoleSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Email is already in use!"));
    }

    #[tokio::test]
    async fn login_issues_token_for_subject() {
        let (service, tokens) = service();
        service
            .register("alice", "alice@example.com", "pw-alice", RoleSet::new())
            .await
            .unwrap();

        let issued = service.login("alice", "pw-alice").await.unwrap();
        assert_eq!(issued.username, "alice");
        assert!(tokens.validate(&issued.token, "alice"));
        assert!(issued.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn login_failures_are_unauthorized() {
        let (service, _) = service();
        service
            .register("alice", "alice@example.com", "pw-alice", RoleSet::new())
            .await
            .unwrap();

        assert!(matches!(
            service.login("alice", "wrong").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            service.login("nobody", "pw-alice").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn unknown_user_is_checked_against_dummy_hash() {
        let (service, _) = service();

        let hashed = service.hash_to_check(None);
        assert!(hashed.starts_with("$2b$04$"));
        assert!(!password::verify("pw-alice", hashed));
        assert!(!password::verify("", hashed));
    }

    #[test]
    fn out_of_range_cost_is_rejected_at_construction() {
        let tokens = Arc::new(TokenCodec::new(b"account-service-test-secret-0123456789", 600));
        let result = AccountService::new(Arc::new(InMemoryUserRepo::new()), tokens, 99);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unknown_user_pays_the_same_bcrypt_cost_as_wrong_password() {
        let tokens = Arc::new(TokenCodec::new(b"account-service-test-secret-0123456789", 600));
        let service =
            AccountService::new(Arc::new(InMemoryUserRepo::new()), tokens, 10).unwrap();
        service
            .register("alice", "alice@example.com", "pw-alice", RoleSet::new())
            .await
            .unwrap();

        let started = std::time::Instant::now();
        assert!(service.login("alice", "wrong").await.is_err());
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        assert!(service.login("mallory", "wrong").await.is_err());
        let unknown_user = started.elapsed();

        // same order of magnitude; without the dummy verify this is microseconds vs milliseconds
        assert!(
            unknown_user * 4 >= wrong_password,
            "wrong_password={wrong_password:?} unknown_user={unknown_user:?}"
        );
    }
}
