//! Account API handlers: register, login, logout and current user

use crate::api::MessageResponse;
use crate::domain::{LoginInput, RegisterInput, User};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bearer token issued by `/login`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Unwrap a JSON body, reporting malformed payloads in the common error shape
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Account",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 422, description = "Invalid registration payload")
    )
)]
pub async fn register<S: HasServices>(
    State(state): State<S>,
    payload: std::result::Result<Json<RegisterInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let user = state.auth_service().register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Account",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Bearer token", body = TokenResponse),
        (status = 422, description = "Credentials rejected")
    )
)]
pub async fn login<S: HasServices>(
    State(state): State<S>,
    payload: std::result::Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let input = json_body(payload)?;
    let issued = state.auth_service().login(input).await?;
    Ok(Json(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Account",
    security(("bearer_jwt" = [])),
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
/// Revoke the token used for this request
pub async fn logout<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>> {
    state.auth_service().logout(&auth).await?;
    Ok(Json(MessageResponse::new("Successfully logged out")))
}

#[utoipa::path(
    get,
    path = "/user",
    tag = "Account",
    security(("bearer_jwt" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me<S: HasServices>(State(state): State<S>, auth: AuthUser) -> Result<Json<User>> {
    let user = state.auth_service().current_user(auth.user_id).await?;
    Ok(Json(user))
}
