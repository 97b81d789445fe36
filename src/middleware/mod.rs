//! Middleware for observability and rate limiting.
//!
//! The authentication and authorization gates live in `crate::auth`; this
//! module provides request logging and per-IP rate limiting.

pub mod logging;
pub mod rate_limit;

pub use logging::request_logging;
pub use rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimiter};
