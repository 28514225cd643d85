//! Bearer token authentication extractors
//!
//! Provides:
//! - `AuthUser` extractor for handlers requiring an authenticated user
//! - `OptionalAuth` for public handlers that personalise their output

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::StringUuid;
use crate::error::{AppError, ErrorResponse};
use crate::jwt::AccessClaims;
use crate::state::HasServices;

/// Acting identity resolved from a bearer token.
///
/// Handlers pass it explicitly to every service call that needs to know
/// who is acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User ID from the token's `sub` claim
    pub user_id: StringUuid,
    /// Stored token row backing this bearer token
    pub token_id: StringUuid,
    pub email: String,
    pub name: String,
}

impl AuthUser {
    pub fn from_claims(claims: AccessClaims) -> Result<Self, AuthError> {
        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::InvalidToken("Invalid user ID in token".to_string()))?;
        let token_id = claims
            .token_id()
            .map_err(|_| AuthError::InvalidToken("Invalid token ID in token".to_string()))?;

        Ok(Self {
            user_id,
            token_id,
            email: claims.email,
            name: claims.name,
        })
    }
}

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader(String),
    /// Token validation failed
    InvalidToken(String),
    /// Signature is fine but the token was revoked (logout)
    Revoked,
    /// The token could not be checked (e.g. the token store is unreachable)
    Service(AppError),
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Unauthorized(_) => AuthError::Revoked,
            AppError::Jwt(e) => AuthError::InvalidToken(e.to_string()),
            AppError::BadRequest(msg) => AuthError::InvalidToken(msg),
            other => AuthError::Service(other),
        }
    }
}

impl AuthError {
    /// Whether the caller simply presented no usable credentials
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, AuthError::Service(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidHeader(_) => "Invalid authorization header",
            AuthError::InvalidToken(_) => "Invalid token",
            AuthError::Revoked => "Token has been revoked",
            AuthError::Service(err) => return err.into_response(),
        };

        let body = ErrorResponse {
            error: "unauthorized".to_string(),
            message: message.to_string(),
            details: None,
        };

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Extract the Bearer token from the Authorization header
pub(crate) fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(AuthError::MissingToken),
        None => Err(AuthError::InvalidHeader(
            "Authorization header must use Bearer scheme".to_string(),
        )),
    }
}

/// Axum extractor for authenticated users.
///
/// Verifies the token signature and that its backing row still exists.
impl<S> FromRequestParts<S> for AuthUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let user = state.auth_service().authenticate(token).await?;
        Ok(user)
    }
}

/// Optional authentication extractor
///
/// Returns `Some(AuthUser)` if a valid token is present, `None` when the
/// token is missing, malformed or revoked. Token store failures still reject.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasServices + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalAuth(Some(user))),
            Err(e) if e.is_credential_failure() => Ok(OptionalAuth(None)),
            Err(e) => Err(e),
        }
    }
}
