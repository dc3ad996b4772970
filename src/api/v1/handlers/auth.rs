/*
 * Responsibility
 * - /auth 系 handler (signup / login / validate / me)
 * - JsonBody extractor で受け、DTO validation → AccountService 呼び出し
 * - validate は内部エラーの種類を一切返さない ({valid: bool} のみ)
 */
use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::api::v1::dto::auth::{
    LoginRequest, LoginResponse, MeResponse, SignupRequest, SignupResponse, ValidateResponse,
};
use crate::api::v1::extractors::{CurrentIdentity, JsonBody};
use crate::error::AppError;
use crate::services::auth::Identity;
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    req.validate().map_err(AppError::invalid_request)?;

    let user = state
        .accounts
        .register(&req.username, &req.email, &req.password, req.roles)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully",
            username: user.username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    req.validate().map_err(AppError::invalid_request)?;

    let issued = state.accounts.login(&req.username, &req.password).await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        username: issued.username,
        expires_at: issued.expires_at,
    }))
}

/// Token introspection. The authenticate middleware has already run, so the
/// answer is simply whether it attached an Identity.
pub async fn validate(identity: Option<Extension<Identity>>) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: identity.is_some(),
    })
}

pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<MeResponse> {
    Json(MeResponse {
        username: identity.subject,
        roles: identity.roles,
    })
}
