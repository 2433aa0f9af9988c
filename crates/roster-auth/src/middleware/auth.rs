//! Bearer token authentication extractor.
//!
//! This module provides the Axum extractor that gates protected routes:
//! it pulls the Bearer token out of the `Authorization` header, hands it
//! to the [`TokenVerifier`], and either exposes the verified claims to
//! the handler or short-circuits with a 401 response.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use roster_auth::{AuthState, BearerAuth};
//!
//! async fn protected_handler(BearerAuth(claims): BearerAuth) -> String {
//!     format!("Hello, {}!", claims.subject().unwrap_or("anonymous"))
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde_json::Value;

use crate::error::AuthError;
use crate::verifier::{Claims, TokenVerifier};

/// State required for bearer token authentication.
///
/// Include this in your application state and expose it to the
/// [`BearerAuth`] extractor via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Verifier for inbound Bearer tokens.
    pub verifier: Arc<TokenVerifier>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

/// Claim set of a verified request, shared cheaply across clones.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    claims: Arc<Claims>,
}

impl VerifiedClaims {
    /// Wraps a verified claim set.
    #[must_use]
    pub fn new(claims: Claims) -> Self {
        Self {
            claims: Arc::new(claims),
        }
    }

    /// Returns the claim with the given name, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Returns the `sub` claim, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// Returns the full claim mapping.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

/// Axum extractor that validates Bearer tokens on protected routes.
///
/// This extractor:
/// 1. Requires an `Authorization: Bearer <token>` header
/// 2. Delegates the token to the [`TokenVerifier`]
/// 3. Exposes the verified claims to the handler
///
/// # Errors
///
/// Returns `AuthError` (which implements `IntoResponse` as a 401) if the
/// header is missing or malformed, or if the token fails any
/// verification check. The response message is deliberately coarse; the
/// precise rejection reason is only logged.
pub struct BearerAuth(pub VerifiedClaims);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AuthError::unauthorized("Authorization header missing or invalid"))?;

        // Wrong scheme or empty token short-circuits before any token
        // parsing happens.
        let token = header
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthorized("Authorization header missing or invalid"))?;

        let claims = auth_state.verifier.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::from(e)
        })?;

        tracing::debug!(
            subject = claims.get("sub").and_then(serde_json::Value::as_str).unwrap_or(""),
            "token validated"
        );

        Ok(BearerAuth(VerifiedClaims::new(claims)))
    }
}
