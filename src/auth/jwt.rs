//! JWT Token Handler
//! Mission: Issue and verify signed bearer credentials

use crate::auth::models::{Claims, User};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Token verification failure.
///
/// Expiry is reported separately from every other failure so the client can
/// show "session expired" instead of "invalid token".
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for TokenError {}

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    expiry_days: i64,
}

impl JwtHandler {
    /// Create a new JWT handler with a signing secret and token lifetime.
    pub fn new(secret: String, expiry_days: i64) -> Self {
        Self { secret, expiry_days }
    }

    /// Issue a signed token for a user, returning the token and its
    /// lifetime in seconds.
    pub fn issue(&self, user: &User) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::days(self.expiry_days))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let expires_in = (self.expiry_days * 24 * 3600) as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp() as usize,
            exp: expiration,
        };

        debug!(
            "Issuing JWT for {} ({}), expires in {}d",
            user.email, user.id, self.expiry_days
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign JWT")?;

        Ok((token, expires_in))
    }

    /// Verify a token and extract its claims.
    ///
    /// Signature, format, and expiry are all checked; an expired but
    /// otherwise well-signed token yields `TokenError::Expired`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        debug!("Verified JWT for {}", decoded.claims.email);

        Ok(decoded.claims)
    }
}
