//! Authentication and authorization
//!
//! The bearer token's subject is the acting user's id; every ledger write
//! records it as the actor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::UserId;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token subject is not a user id: {0}")]
    InvalidSubject(String),
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &UserId,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let validity = i64::try_from(expiration_secs).map_err(|_| AuthError::InvalidToken)?;
    let exp = now + Duration::seconds(validity);

    let claims = Claims {
        sub: user_id.as_uuid().to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Permission definitions
pub mod permissions {
    pub const LEDGER_READ: &str = "ledger:read";
    pub const LEDGER_WRITE: &str = "ledger:write";
    pub const INVOICE_ISSUE: &str = "invoice:issue";
    pub const PAYMENT_WRITE: &str = "payment:write";
    pub const PAYMENT_REFUND: &str = "payment:refund";
}

/// The authenticated user behind a request
///
/// Extracted from the claims that `auth_middleware` left in the request
/// extensions.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: UserId,
    pub claims: Claims,
}

impl Actor {
    pub fn from_claims(claims: Claims) -> Result<Self, AuthError> {
        let uuid = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))?;
        Ok(Self {
            user_id: UserId::from_uuid(uuid),
            claims,
        })
    }

    /// Fails with `Forbidden` unless the actor holds `permission`
    pub fn require(&self, permission: &str) -> Result<UserId, ApiError> {
        if has_role(&self.claims, permission) {
            Ok(self.user_id)
        } else {
            Err(AuthError::MissingPermission(permission.to_string()).into())
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or(ApiError::Unauthorized)?;
        Ok(Actor::from_claims(claims)?)
    }
}
