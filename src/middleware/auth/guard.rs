//! Route guards: evaluate a `RoleRequirement` against the request's Identity.
//!
//! Applied with `route_layer` so unmatched paths still fall through to 404/405
//! instead of being masked by 401.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{Decision, Identity, Role, RoleRequirement};

pub fn require<S>(router: Router<S>, requirement: RoleRequirement) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(requirement, guard))
}

/// Any identity holding at least one of `roles`.
pub fn require_any_role<S>(router: Router<S>, roles: impl IntoIterator<Item = Role>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    require(router, RoleRequirement::any_of(roles))
}

/// Any authenticated identity, roles ignored.
pub fn require_authenticated<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    require(router, RoleRequirement::Authenticated)
}

async fn guard(
    State(requirement): State<RoleRequirement>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match requirement.evaluate(req.extensions().get::<Identity>()) {
        Decision::Allow => Ok(next.run(req).await),
        Decision::Deny(reason) => {
            tracing::debug!(?reason, path = %req.uri().path(), "access denied");
            Err(reason.into())
        }
    }
}
