//! API Router
//! Mission: Wire the gate ordering - authenticate, then authorize, then handle

use crate::api::users;
use crate::audit::AuditStore;
use crate::auth::{api as auth_api, authenticate, authorize, JwtHandler, Role, UserStore};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Json,
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Roles allowed to administer user accounts.
const USER_ADMIN_ROLES: &[Role] = &[Role::AdminOei];

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub audit: Arc<AuditStore>,
    pub tokens: Arc<JwtHandler>,
}

/// Create the API router.
///
/// Route groups, innermost first: public endpoints; authenticated endpoints
/// behind the authentication gate; admin endpoints additionally behind the
/// authorization gate. Within one request authentication always runs before
/// authorization.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login));

    let authenticated = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route("/api/auth/change-password", post(auth_api::change_password));

    let admin = Router::new()
        .route("/api/users", get(users::list_users))
        .route("/api/users/:id/approve", patch(users::approve_user))
        .route("/api/users/:id/deactivate", patch(users::deactivate_user))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            authorize(USER_ADMIN_ROLES, req, next)
        }));

    let protected = authenticated.merge(admin).route_layer(
        middleware::from_fn_with_state(state.clone(), authenticate),
    );

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Training Management System API running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    message: String,
    version: String,
    timestamp: String,
}
