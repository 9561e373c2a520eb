//! Caller authentication.
//!
//! Handlers never look at credentials themselves; they hold an
//! [`Authenticator`] and ask it who the caller is.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use shelf_kernel::settings::AuthSettings;
use thiserror::Error;

/// The identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingCredentials,

    #[error("invalid auth scheme")]
    InvalidScheme,

    #[error("unknown or revoked token")]
    UnknownToken,
}

/// Resolves the current principal from request headers.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;
}

/// Bearer-token authenticator backed by a static token table.
pub struct TokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl TokenAuthenticator {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        if settings.tokens.is_empty() {
            tracing::warn!("no auth tokens configured; every principal lookup will be rejected");
        }
        Self::new(settings.tokens.clone())
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AuthError::InvalidScheme)?;

        let name = self.tokens.get(token.trim()).ok_or_else(|| {
            tracing::warn!("rejected unknown bearer token");
            AuthError::UnknownToken
        })?;

        Ok(Principal { name: name.clone() })
    }
}
