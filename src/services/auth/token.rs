//! Bearer token codec (compact JWS, HS256).
//!
//! Wire format: `b64url(header).b64url(payload).b64url(hmac)` with header
//! `{"alg":"HS256","typ":"JWT"}` and payload `{"sub","iat","exp"}` in epoch seconds.
//!
//! Signature checks go through the crypto backend's HMAC verify, which compares
//! tags in constant time.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
    #[error("subject mismatch")]
    SubjectMismatch,
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    fn from_verify(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::SignatureMismatch,
            _ => Self::Malformed,
        }
    }
}

/// Issues and checks bearer tokens with a process-wide symmetric secret.
///
/// Built once at start-up and shared read-only (`Arc<TokenCodec>`).
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    // signature on, expiry checked by hand (strict `exp > now`, no leeway)
    verify_validation: Validation,
    ttl_seconds: i64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    /// `ttl_seconds` may be zero or negative; tokens issued that way are never valid.
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        let mut verify_validation = Validation::new(ALGORITHM);
        verify_validation.validate_exp = false;
        verify_validation.validate_aud = false;
        verify_validation.leeway = 0;
        verify_validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            verify_validation,
            ttl_seconds,
        }
    }

    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let iat = now.timestamp();
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(self.ttl_seconds),
        };

        let mut header = Header::new(ALGORITHM);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign token");
            TokenError::Signing(e)
        })
    }

    /// Returns the embedded subject WITHOUT checking signature or expiry.
    ///
    /// Only for looking up the identity before [`TokenCodec::validate`]; never
    /// treat the result as authenticated.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.parse(token)?;
        if claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }
        Ok(claims.sub)
    }

    pub fn expiry_of(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claims = self.parse(token)?;
        DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)
    }

    /// Fail-closed check: `true` only for a well-formed, correctly signed,
    /// unexpired token whose subject equals `expected_subject`.
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        self.verify(token, expected_subject).is_ok()
    }

    /// Same checks as [`TokenCodec::validate`], keeping the failure reason.
    pub fn verify(&self, token: &str, expected_subject: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, expected_subject, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        expected_subject: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        let claims =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.verify_validation)
                .map_err(TokenError::from_verify)?
                .claims;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        if claims.sub != expected_subject {
            return Err(TokenError::SubjectMismatch);
        }

        Ok(claims)
    }

    /// Structure only: no signature, no expiry. `sub`/`iat`/`exp` must all be present.
    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)
            .map_err(|_| TokenError::Malformed)?;
        if data.header.alg != ALGORITHM {
            return Err(TokenError::Malformed);
        }
        Ok(data.claims)
    }
}
