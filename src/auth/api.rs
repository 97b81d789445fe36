//! Authentication API Endpoints
//! Mission: Login, self-registration, profile, and password change

use crate::api::routes::AppState;
use crate::audit::{AuditAction, NewAuditEntry, RequestOrigin};
use crate::auth::middleware::CurrentUser;
use crate::auth::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, Role, UserResponse,
};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::user_store::{NewUser, StoreError};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use tracing::{info, warn};

/// Errors surfaced by the auth and user-administration endpoints.
#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,
    PendingApproval,
    WrongCurrentPassword,
    Validation(&'static str),
    Conflict,
    NotFound,
    Internal(anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => ApiError::Conflict,
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid credentials" }),
            ),
            ApiError::PendingApproval => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Account inactive or pending approval",
                    "message": "Your account has not yet been approved by an administrator",
                }),
            ),
            ApiError::WrongCurrentPassword => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Current password is incorrect" }),
            ),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Conflict => (
                StatusCode::CONFLICT,
                json!({ "error": "User or email already exists" }),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "User not found" })),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                // Detail only leaves the process in debug builds
                let body = if cfg!(debug_assertions) {
                    json!({ "error": "Internal server error", "detail": err.to_string() })
                } else {
                    json!({ "error": "Internal server error" })
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Email and password are required"));
    }

    info!("🔐 Login attempt: {}", payload.email);

    let user = state
        .users
        .find_by_email(&payload.email)?
        .ok_or(ApiError::InvalidCredentials)?;

    // The approval state is checked before the password so a pending user
    // with correct credentials sees "pending approval", not "invalid
    // credentials".
    if !user.is_active || !user.is_approved {
        warn!("🚫 Login blocked, account not approved: {}", payload.email);
        return Err(ApiError::PendingApproval);
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!("❌ Failed login attempt: {}", payload.email);
        return Err(ApiError::InvalidCredentials);
    }

    let (token, expires_in) = state.tokens.issue(&user)?;

    state.users.update_last_login(&user.id)?;

    state.audit.append(NewAuditEntry {
        action: AuditAction::Login,
        entity: "USER".to_string(),
        entity_id: user.id.to_string(),
        user_id: user.id,
        changes: None,
        origin: RequestOrigin::from_headers(&headers),
    })?;

    info!("✅ Login successful: {} ({})", user.email, user.role.as_str());

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Self-registration endpoint - POST /api/auth/register
///
/// New accounts start inactive and unapproved; an administrator must approve
/// them before the first login.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if payload.email.is_empty()
        || payload.username.is_empty()
        || payload.password.is_empty()
        || payload.full_name.is_empty()
    {
        return Err(ApiError::Validation("All fields are required"));
    }

    // Checked up front for a clean message; the unique constraints still
    // back this up against races.
    if state.users.find_by_email(&payload.email)?.is_some()
        || state.users.find_by_username(&payload.username)?.is_some()
    {
        return Err(ApiError::Conflict);
    }

    let user = state.users.create(NewUser {
        email: payload.email,
        username: payload.username,
        password: payload.password,
        full_name: payload.full_name,
        role: payload.role.unwrap_or(Role::Coordinador),
    })?;

    state.audit.append(NewAuditEntry {
        action: AuditAction::Create,
        entity: "USER".to_string(),
        entity_id: user.id.to_string(),
        user_id: user.id,
        changes: None,
        origin: RequestOrigin::from_headers(&headers),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully. Pending approval.",
            "user": UserResponse::from_user(&user),
        })),
    ))
}

/// Current user profile - GET /api/auth/me
///
/// Re-reads the row so the response reflects the live account state, not
/// the token claims.
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(&current.user_id)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Password change - POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::Validation("Passwords are required"));
    }
    if payload.new_password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters",
        ));
    }

    let user = state
        .users
        .find_by_id(&current.user_id)?
        .ok_or(ApiError::NotFound)?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(ApiError::WrongCurrentPassword);
    }

    let new_hash = hash_password(&payload.new_password)?;
    state.users.update_password(&user.id, &new_hash)?;

    state.audit.append(NewAuditEntry {
        action: AuditAction::Update,
        entity: "USER".to_string(),
        entity_id: user.id.to_string(),
        user_id: user.id,
        changes: Some(json!({ "action": "password_changed" }).to_string()),
        origin: RequestOrigin::from_headers(&headers),
    })?;

    info!("🔑 Password changed: {}", user.email);

    Ok(Json(json!({ "message": "Password updated successfully" })))
}
