/*
 * Responsibility
 * - /auth 系の request/response DTO
 * - validate() で形式チェック (空文字・メール形式・長さ)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::auth::RoleSet;

const MAX_USERNAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;
const MAX_PASSWORD_LEN: usize = 72; // bcrypt only uses the first 72 bytes

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    // Missing or empty -> USER
    #[serde(default)]
    pub roles: RoleSet,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username is required");
        }
        if username.len() > MAX_USERNAME_LEN {
            return Err("username must be <= 64 chars");
        }
        if username != self.username {
            return Err("username must not have surrounding whitespace");
        }
        if !is_plausible_email(&self.email) {
            return Err("email must be a valid email address");
        }
        if self.password.trim().is_empty() {
            return Err("password is required");
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err("password must be <= 72 bytes");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.password.is_empty() {
            return Err("password is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: &'static str,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub roles: RoleSet,
}

fn is_plausible_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
