pub mod access;
pub mod authenticator;
pub mod identity;
pub mod password;
pub mod role;
pub mod token;

pub use access::{Decision, DenyReason, RoleRequirement, decide, decide_authenticated};
pub use authenticator::Authenticator;
pub use identity::{Identity, IdentityResolver, ResolveError};
pub use role::{Role, RoleSet};
pub use token::{TokenClaims, TokenCodec, TokenError};
