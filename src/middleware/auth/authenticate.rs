//! Bearer 認証 → Identity を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` があれば Authenticator で検証する
//! - 失敗してもリクエストは拒否しない (Identity を入れずに次へ進める)
//! - 許可/拒否の判断は guard (route_layer) 側の責務

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::state::AppState;

/// API 全体に認証 middleware を適用する。
///
/// 例：
/// ```ignore
/// let api = Router::new().nest("/api/v1", api::v1::routes());
/// let api = middleware::auth::authenticate::apply(api, state.clone());
/// let app = api.with_state(state);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, authenticate_middleware))
}

async fn authenticate_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Non-UTF-8 header values are treated as absent.
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if let Some(identity) = state
        .authenticator
        .authenticate(authorization.as_deref())
        .await
    {
        tracing::debug!(subject = %identity.subject, "request authenticated");
        // middleware → guard / extractor への受け渡し
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}
