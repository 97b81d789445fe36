//! Authentication Models
//! Mission: Define user accounts, roles, and token claims

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_approved: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

/// System roles.
///
/// The literal values are stable wire constants shared with the database and
/// the frontend clients; do not rename them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "ADMIN_OEI")]
    AdminOei, // Full access, user administration
    #[serde(rename = "COORDINADOR")]
    Coordinador, // Program coordination
    #[serde(rename = "PROVEEDOR")]
    Proveedor, // Training provider
    #[serde(rename = "CONSULTA")]
    Consulta, // Read-only access
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AdminOei => "ADMIN_OEI",
            Role::Coordinador => "COORDINADOR",
            Role::Proveedor => "PROVEEDOR",
            Role::Consulta => "CONSULTA",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN_OEI" => Some(Role::AdminOei),
            "COORDINADOR" => Some(Role::Coordinador),
            "PROVEEDOR" => Some(Role::Proveedor),
            "CONSULTA" => Some(Role::Consulta),
            _ => None,
        }
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub email: String,
    pub role: Role,
    pub iat: usize, // issued-at timestamp
    pub exp: usize, // expiration timestamp
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Self-registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<Role>, // defaults to COORDINADOR
}

/// Password change request body
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub expires_in: usize, // seconds until expiration
    pub user: UserResponse,
}

/// User response (sanitized)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_approved: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            is_active: user.is_active,
            is_approved: user.is_approved,
            created_at: user.created_at.clone(),
            last_login: user.last_login.clone(),
        }
    }
}
