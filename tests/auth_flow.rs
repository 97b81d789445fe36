//! End-to-end tests for the authentication, authorization, and audit layer.
//!
//! Drives the real router with in-memory requests against a throwaway
//! SQLite database.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use formativa_backend::{
    api::{build_router, AppState},
    audit::AuditStore,
    auth::{JwtHandler, UserStore},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

fn test_app() -> (Router, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap();

    let state = AppState {
        users: Arc::new(UserStore::new(db_path).unwrap()),
        audit: Arc::new(AuditStore::new(db_path).unwrap()),
        tokens: Arc::new(JwtHandler::new("test-secret-key-12345".to_string(), 7)),
    };

    (build_router(state), temp_file)
}

async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn health_check_is_public() {
    let (app, _db) = test_app();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let (app, _db) = test_app();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization token");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let (app, _db) = test_app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/auth/me",
        Some("not.a.token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn admin_login_yields_admin_role_token() {
    let (app, _db) = test_app();

    let (status, body) = login(&app, "admin@oei.sv", "admin123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "ADMIN_OEI");

    // The role claim survives the round trip through the token
    let verifier = JwtHandler::new("test-secret-key-12345".to_string(), 7);
    let claims = verifier.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role.as_str(), "ADMIN_OEI");
    assert_eq!(claims.email, "admin@oei.sv");
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let (app, _db) = test_app();

    let (status, body) = login(&app, "admin@oei.sv", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = login(&app, "nobody@oei.sv", "admin123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_approval_lifecycle() {
    let (app, db) = test_app();

    // Self-registration lands in the pending state
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "maria@oei.sv",
            "username": "maria",
            "password": "clave-segura",
            "full_name": "María López",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["is_active"], false);
    assert_eq!(body["user"]["is_approved"], false);
    assert_eq!(body["user"]["role"], "COORDINADOR");
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    // Correct credentials but pending approval: a distinct message, not
    // "invalid credentials"
    let (status, body) = login(&app, "maria@oei.sv", "clave-segura").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account inactive or pending approval");

    // Administrator approves the account
    let (_, admin_body) = login(&app, "admin@oei.sv", "admin123").await;
    let admin_token = admin_body["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{}/approve", user_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Login now succeeds and the token works
    let (status, body) = login(&app, "maria@oei.sv", "clave-segura").await;
    assert_eq!(status, StatusCode::OK);
    let user_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "maria@oei.sv");
    assert!(body["last_login"].is_string());

    // Deactivation revokes the still-unexpired token on the next request
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{}/deactivate", user_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not authorized");

    // The whole lifecycle left an audit trail
    let audit = AuditStore::new(db.path().to_str().unwrap()).unwrap();
    let actions: Vec<String> = audit
        .recent(50)
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert!(actions.contains(&"CREATE".to_string()));
    assert!(actions.contains(&"LOGIN".to_string()));
    assert!(actions.contains(&"UPDATE".to_string()));
}

#[tokio::test]
async fn duplicate_registration_is_conflict() {
    let (app, _db) = test_app();

    let payload = json!({
        "email": "maria@oei.sv",
        "username": "maria",
        "password": "clave-segura",
        "full_name": "María López",
    });

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User or email already exists");
}

#[tokio::test]
async fn non_admin_cannot_administer_users() {
    let (app, _db) = test_app();

    // Register and approve a coordinator
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "coord@oei.sv",
            "username": "coord",
            "password": "clave-segura",
            "full_name": "Coordinador",
        })),
    )
    .await;
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    let (_, admin_body) = login(&app, "admin@oei.sv", "admin123").await;
    let admin_token = admin_body["token"].as_str().unwrap().to_string();
    send(
        &app,
        Method::PATCH,
        &format!("/api/users/{}/approve", user_id),
        Some(&admin_token),
        None,
    )
    .await;

    let (_, body) = login(&app, "coord@oei.sv", "clave-segura").await;
    let coord_token = body["token"].as_str().unwrap().to_string();

    // A coordinator can read their own profile but not the user list
    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&coord_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/users", Some(&coord_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("ADMIN_OEI"));
}

#[tokio::test]
async fn admin_can_list_users() {
    let (app, _db) = test_app();

    let (_, admin_body) = login(&app, "admin@oei.sv", "admin123").await;
    let admin_token = admin_body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert!(users.iter().any(|u| u["email"] == "admin@oei.sv"));
    // Sanitized responses never carry a hash
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let (app, _db) = test_app();

    let (_, admin_body) = login(&app, "admin@oei.sv", "admin123").await;
    let admin_token = admin_body["token"].as_str().unwrap().to_string();

    // Wrong current password
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/change-password",
        Some(&admin_token),
        Some(json!({
            "current_password": "incorrect",
            "new_password": "nueva-clave",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Current password is incorrect");

    // Too-short replacement
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/change-password",
        Some(&admin_token),
        Some(json!({
            "current_password": "admin123",
            "new_password": "corta",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Valid change, then the old password stops working
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/change-password",
        Some(&admin_token),
        Some(json!({
            "current_password": "admin123",
            "new_password": "nueva-clave",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "admin@oei.sv", "admin123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "admin@oei.sv", "nueva-clave").await;
    assert_eq!(status, StatusCode::OK);
}
