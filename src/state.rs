/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - accounts: signup/login, authenticator: Bearer → Identity
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::repos::user_repo::UserRepo;
use crate::services::account::AccountService;
use crate::services::auth::{Authenticator, IdentityResolver, TokenCodec};

#[derive(Clone, Debug)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    /// Wire the services around one identity store and one token codec.
    pub fn new(
        users: Arc<dyn UserRepo>,
        tokens: Arc<TokenCodec>,
        bcrypt_cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        let accounts = AccountService::new(users.clone(), tokens.clone(), bcrypt_cost)?;
        let authenticator = Authenticator::new(tokens, IdentityResolver::new(users));

        Ok(Self {
            accounts: Arc::new(accounts),
            authenticator: Arc::new(authenticator),
        })
    }
}
