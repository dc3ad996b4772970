/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - ルートごとの role 要件 (guard) をここで宣言する
 *   - public: guard なし
 *   - /auth/me: 認証済みなら誰でも
 *   - /admin: ADMIN, /mod: MODERATOR or ADMIN
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    admin::{list_users, update_system_config},
    auth::{login, me, signup, validate},
    health::health,
    moderator::{reports, review_content},
};
use crate::middleware::auth::guard;
use crate::services::auth::Role;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/validate", post(validate));

    let authenticated = guard::require_authenticated(Router::new().route("/auth/me", get(me)));

    let admin = guard::require_any_role(
        Router::new()
            .route("/admin/users", get(list_users))
            .route("/admin/system/config", post(update_system_config)),
        [Role::Admin],
    );

    let moderator = guard::require_any_role(
        Router::new()
            .route("/mod/reports", get(reports))
            .route("/mod/content/review", post(review_content)),
        [Role::Moderator, Role::Admin],
    );

    public.merge(authenticated).merge(admin).merge(moderator)
}
