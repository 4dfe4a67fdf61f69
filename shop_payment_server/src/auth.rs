//! Bearer token handling.
//!
//! Tokens are issued by the shop's account service and signed with a shared HS256 secret. The server only ever
//! validates them; [`TokenIssuer`] exists for tooling and tests.
use std::fmt::Display;

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Sales,
    Customer,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Sales)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Sales => write!(f, "sales"),
            Role::Customer => write!(f, "customer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id, as a string
    pub sub: String,
    pub role: Role,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub
            .parse::<i64>()
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Subject '{}' is not a user id. {e}", self.sub)))
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

/// Handlers can take `JwtClaims` as an argument. The claims are placed in the request extensions by
/// [`crate::middleware::JwtMiddlewareService`], so this extractor fails for routes outside the authenticated scope.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::ValidationError(e.to_string()),
            _ => AuthError::PoorlyFormattedToken(e.to_string()),
        })?;
        debug!("Access token validated for user {} ({})", data.claims.sub, data.claims.role);
        Ok(data.claims)
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    /// Issue a new access token for the given user, valid for `duration` (default 24 hours).
    pub fn issue_token(&self, user_id: i64, role: Role, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or_else(|| Duration::hours(24));
        let claims = JwtClaims { sub: user_id.to_string(), role, exp: (Utc::now() + duration).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}
