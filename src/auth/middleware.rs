//! Authentication & Authorization Gates
//! Mission: Resolve request identity and enforce role access per route

use crate::api::routes::AppState;
use crate::auth::jwt::TokenError;
use crate::auth::models::Role;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;

/// Identity resolved by the authentication gate, attached to the request
/// for downstream handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Gate failures, each with a distinct stable message.
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token presented. Rejected before any verification.
    MissingCredential,
    /// Token signature or format is invalid.
    InvalidToken,
    /// Token was well-signed but is past its expiry.
    ExpiredToken,
    /// Token subject no longer exists or has been deactivated.
    UnknownOrInactiveSubject,
    /// Authorization ran without a resolved identity. Fails closed.
    Unauthenticated,
    /// Authenticated, but the role is not in the route's allowed set.
    Forbidden(&'static [Role]),
    /// Storage failure while resolving the subject.
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Missing authorization token" }),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Invalid token",
                    "message": "The authentication token is not valid",
                }),
            ),
            AuthError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Token expired",
                    "message": "The session has expired, please log in again",
                }),
            ),
            AuthError::UnknownOrInactiveSubject => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "User not authorized" }),
            ),
            AuthError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Not authenticated" }),
            ),
            AuthError::Forbidden(required) => {
                let roles: Vec<&str> = required.iter().map(|r| r.as_str()).collect();
                (
                    StatusCode::FORBIDDEN,
                    json!({
                        "error": "Access denied",
                        "message": format!(
                            "Requires one of the following roles: {}",
                            roles.join(", ")
                        ),
                    }),
                )
            }
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Pull the token out of the `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Authentication gate.
///
/// Verifies the bearer token and re-resolves its subject against the user
/// store on every request. Deactivating an account therefore revokes all of
/// its outstanding tokens immediately, not at token expiry.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingCredential)?;

    let claims = state.tokens.verify(token).map_err(|e| match e {
        TokenError::Expired => AuthError::ExpiredToken,
        TokenError::Invalid => AuthError::InvalidToken,
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

    let user = state
        .users
        .find_by_id(&user_id)
        .map_err(|e| {
            tracing::error!("User lookup failed during authentication: {}", e);
            AuthError::Internal
        })?
        .filter(|u| u.is_active)
        .ok_or(AuthError::UnknownOrInactiveSubject)?;

    req.extensions_mut().insert(CurrentUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(req).await)
}

/// Authorization gate, parameterized by the set of permitted roles.
///
/// Must run after the authentication gate; if identity is missing it fails
/// closed rather than letting the request through. Role membership is exact,
/// with no hierarchy.
pub async fn authorize(
    allowed: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::Unauthenticated)?;

    if !allowed.contains(&user.role) {
        return Err(AuthError::Forbidden(allowed));
    }

    Ok(next.run(req).await)
}
