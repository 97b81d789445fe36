//! User Administration Endpoints
//! Mission: Admin-only listing, approval, and deactivation of accounts

use crate::api::routes::AppState;
use crate::audit::{AuditAction, NewAuditEntry, RequestOrigin};
use crate::auth::api::ApiError;
use crate::auth::middleware::CurrentUser;
use crate::auth::models::UserResponse;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    Extension,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// List all users - GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list()?;
    let response: Vec<UserResponse> = users.iter().map(UserResponse::from_user).collect();

    Ok(Json(response))
}

/// Approve a pending account - PATCH /api/users/:id/approve
pub async fn approve_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state.users.approve(&id)?;

    state.audit.append(NewAuditEntry {
        action: AuditAction::Update,
        entity: "USER".to_string(),
        entity_id: id.to_string(),
        user_id: current.user_id,
        changes: Some(json!({ "action": "user_approved" }).to_string()),
        origin: RequestOrigin::from_headers(&headers),
    })?;

    info!("✅ User approved by {}: {}", current.email, user.email);

    Ok(Json(json!({
        "message": "User approved successfully",
        "user": UserResponse::from_user(&user),
    })))
}

/// Deactivate an account - PATCH /api/users/:id/deactivate
///
/// Takes effect on the account's very next request, since the
/// authentication gate re-checks `is_active` every time.
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state.users.deactivate(&id)?;

    state.audit.append(NewAuditEntry {
        action: AuditAction::Update,
        entity: "USER".to_string(),
        entity_id: id.to_string(),
        user_id: current.user_id,
        changes: Some(json!({ "action": "user_deactivated" }).to_string()),
        origin: RequestOrigin::from_headers(&headers),
    })?;

    info!("🚫 User deactivated by {}: {}", current.email, user.email);

    Ok(Json(json!({
        "message": "User deactivated successfully",
        "user": UserResponse::from_user(&user),
    })))
}
