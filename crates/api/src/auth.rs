//! Caller identity and admin access.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use secrecy::{ExposeSecret, SecretString};

use crate::config::AuthToken;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the admin API key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// An authenticated customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

/// Resolves bearer tokens to identities.
///
/// Token issuance and signature checks live outside this service; an
/// implementation only has to answer "who is this token".
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Identity>;
}

/// Resolver backed by a fixed list of tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    tokens: Vec<AuthToken>,
}

impl StaticTokenResolver {
    pub fn new(tokens: Vec<AuthToken>) -> Self {
        Self { tokens }
    }

    /// Adds a token, mostly useful in tests.
    pub fn with_token(mut self, token: impl Into<String>, email: impl Into<String>) -> Self {
        self.tokens.push(AuthToken {
            token: SecretString::from(token.into()),
            email: email.into(),
        });
        self
    }
}

impl IdentityResolver for StaticTokenResolver {
    fn resolve(&self, token: &str) -> Option<Identity> {
        self.tokens
            .iter()
            .find(|t| t.token.expose_secret() == token)
            .map(|t| Identity {
                email: t.email.clone(),
            })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        state
            .identity
            .resolve(token)
            .ok_or_else(|| ApiError::Forbidden("Invalid token".to_string()))
    }
}

/// Marker extractor for requests carrying the configured admin key.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.admin_key else {
            return Err(ApiError::Forbidden("Admin API is disabled".to_string()));
        };

        let supplied = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing admin key".to_string()))?;

        if supplied != expected.expose_secret() {
            tracing::warn!("rejected admin request with wrong key");
            return Err(ApiError::Forbidden("Invalid admin key".to_string()));
        }

        Ok(Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resolver() {
        let resolver = StaticTokenResolver::default().with_token("tok", "ada@example.com");

        assert_eq!(
            resolver.resolve("tok"),
            Some(Identity {
                email: "ada@example.com".to_string()
            })
        );
        assert!(resolver.resolve("other").is_none());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let (mut parts, _) = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer abc ")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), Some("abc"));

        parts
            .headers
            .insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&parts), None);
    }
}
