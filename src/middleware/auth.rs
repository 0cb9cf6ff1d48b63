//! Bearer token authentication
//!
//! Provides the `AuthUser` extractor carrying the acting identity of a request.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::domain::{ClientType, StringUuid};
use crate::error::AppError;
use crate::jwt::AccessClaims;
use crate::state::HasServices;

/// Acting identity extracted from a verified JWT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User or service account ID from the token's `sub` claim
    pub user_id: StringUuid,
    pub client_type: ClientType,
}

impl AuthUser {
    pub fn from_claims(claims: AccessClaims) -> Result<Self, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("Invalid subject in token".to_string()))?;

        Ok(Self {
            user_id: user_id.into(),
            client_type: claims.client_type,
        })
    }
}

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    MissingToken,
    InvalidHeader(String),
    InvalidToken(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = match err {
            AuthError::MissingToken => "Missing authorization token".to_string(),
            AuthError::InvalidHeader(msg) | AuthError::InvalidToken(msg) => msg,
        };
        AppError::Unauthenticated(message)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::InvalidHeader("Authorization header must use Bearer scheme".to_string())
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = state
            .jwt_manager()
            .verify_access_token(token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        AuthUser::from_claims(claims)
    }
}
