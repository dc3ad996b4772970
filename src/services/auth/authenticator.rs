use std::sync::Arc;

use tracing::{debug, warn};

use crate::services::auth::identity::{Identity, IdentityResolver, ResolveError};
use crate::services::auth::token::TokenCodec;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Single-pass bearer authentication: header → subject → identity → token check.
///
/// Every failure collapses to `None` (request continues unauthenticated).
/// Reasons are logged at debug level only, never returned to the caller.
#[derive(Clone, Debug)]
pub struct Authenticator {
    tokens: Arc<TokenCodec>,
    identities: IdentityResolver,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenCodec>, identities: IdentityResolver) -> Self {
        Self { tokens, identities }
    }

    /// `authorization` is the raw `Authorization` header value, if any.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Option<Identity> {
        let token = authorization?.strip_prefix(BEARER_PREFIX)?;

        let subject = match self.tokens.extract_subject(token) {
            Ok(subject) => subject,
            Err(err) => {
                debug!(reason = %err, "bearer token not parseable");
                return None;
            }
        };

        let identity = match self.identities.resolve(&subject).await {
            Ok(identity) => identity,
            Err(ResolveError::SubjectNotFound) => {
                debug!("bearer token subject not found");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "identity lookup failed");
                return None;
            }
        };

        if let Err(err) = self.tokens.verify(token, &subject) {
            debug!(reason = %err, "bearer token rejected");
            return None;
        }

        Some(identity)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::repos::memory_user_repo::InMemoryUserRepo;
    use crate::repos::user_repo::{NewUser, UserRepo};
    use crate::services::auth::access::{Decision, DenyReason, decide};
    use crate::services::auth::role::{Role, RoleSet};

    const SECRET: &[u8] = b"authenticator-test-secret-0123456789abcdef";

    async fn setup() -> (Authenticator, Arc<TokenCodec>) {
        let repo = Arc::new(InMemoryUserRepo::new());
        repo.insert(NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$04$unused".to_string(),
            roles: RoleSet::from([Role::Admin]),
        })
        .await
        .unwrap();

        let tokens = Arc::new(TokenCodec::new(SECRET, 3600));
        let authenticator = Authenticator::new(tokens.clone(), IdentityResolver::new(repo));
        (authenticator, tokens)
    }

    fn bearer(token: &str) -> String {
        format!("{BEARER_PREFIX}{token}")
    }

    #[tokio::test]
    async fn valid_bearer_token_attaches_identity() {
        let (auth, tokens) = setup().await;
        let header = bearer(&tokens.issue("alice").unwrap());

        let identity = auth.authenticate(Some(&header)).await.unwrap();
        assert_eq!(identity, Identity::new("alice", [Role::Admin]));

        assert_eq!(
            decide(Some(&identity), &RoleSet::from([Role::Admin])),
            Decision::Allow
        );
        assert_eq!(
            decide(Some(&identity), &RoleSet::from([Role::Moderator])),
            Decision::Deny(DenyReason::Forbidden)
        );
    }

    #[tokio::test]
    async fn missing_header_stays_unauthenticated() {
        let (auth, _) = setup().await;

        let identity = auth.authenticate(None).await;
        assert!(identity.is_none());
        assert_eq!(decide(identity.as_ref(), &RoleSet::new()), Decision::Allow);
        assert_eq!(
            decide(identity.as_ref(), &RoleSet::from([Role::User])),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn non_bearer_schemes_are_ignored() {
        let (auth, tokens) = setup().await;
        let token = tokens.issue("alice").unwrap();

        for header in [
            format!("Basic {token}"),
            format!("bearer {token}"),
            format!("Bearer{token}"),
            token.clone(),
        ] {
            assert!(auth.authenticate(Some(&header)).await.is_none(), "{header}");
        }
    }

    #[tokio::test]
    async fn malformed_token_stays_unauthenticated() {
        let (auth, _) = setup().await;

        assert!(auth.authenticate(Some("Bearer not-a-token")).await.is_none());
        assert!(auth.authenticate(Some("Bearer ")).await.is_none());
    }

    #[tokio::test]
    async fn unknown_subject_stays_unauthenticated() {
        let (auth, tokens) = setup().await;
        let header = bearer(&tokens.issue("ghost").unwrap());

        assert!(auth.authenticate(Some(&header)).await.is_none());
    }

    #[tokio::test]
    async fn expired_token_stays_unauthenticated() {
        let (auth, tokens) = setup().await;
        let stale = tokens
            .issue_at("alice", Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(auth.authenticate(Some(&bearer(&stale))).await.is_none());
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_stays_unauthenticated() {
        let (auth, _) = setup().await;
        let forged = TokenCodec::new(b"some-other-secret-value-of-enough-length", 3600)
            .issue("alice")
            .unwrap();

        assert!(auth.authenticate(Some(&bearer(&forged))).await.is_none());
    }
}
