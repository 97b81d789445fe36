//! Authentication Module
//! Mission: Password hashing, bearer tokens, identity gates, and user storage

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod user_store;

pub use jwt::JwtHandler;
pub use middleware::{authenticate, authorize, CurrentUser};
pub use models::Role;
pub use user_store::UserStore;
