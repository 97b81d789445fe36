//! Formativa Backend Library
//!
//! REST backend for a training-program management system. The core of the
//! crate is the authentication, authorization, and audit-logging layer;
//! every route passes through the gates wired up in `api::routes`.

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod middleware;
