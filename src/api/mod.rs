//! HTTP API surface.

pub mod routes;
pub mod users;

pub use routes::{build_router, AppState};
