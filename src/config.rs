//! Process Configuration
//! Mission: Gather environment settings once at startup into one value

use crate::middleware::RateLimitConfig;
use std::env;
use std::time::Duration;

/// Configuration loaded once at startup and passed by reference into the
/// components that need it. No module-level globals.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Signing secret for bearer tokens. Rotating it invalidates every
    /// outstanding token.
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub db_path: String,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Read configuration from the environment, with development defaults.
    pub fn from_env() -> Self {
        let port = env::var("PORT").unwrap_or_else(|_| "3001".to_string());
        let bind_addr = format!("0.0.0.0:{}", port);

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());

        let jwt_expiry_days = env::var("JWT_EXPIRES_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(7);

        let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "formativa.db".to_string());

        let max_requests = env::var("RATE_LIMIT_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(100);
        let window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(15 * 60);

        Self {
            bind_addr,
            jwt_secret,
            jwt_expiry_days,
            db_path,
            rate_limit: RateLimitConfig {
                max_requests,
                window: Duration::from_secs(window_secs),
            },
        }
    }
}
