//! # roster-auth
//!
//! Cognito-backed authentication for the Roster server.
//!
//! This crate provides:
//! - JWKS fetching at startup and key lookup by key ID
//! - Access/ID token verification (signature, algorithm, audience, issuer)
//! - An Axum extractor that gates protected routes on a Bearer token
//! - A login client for the Cognito `USER_PASSWORD_AUTH` flow
//!
//! ## Modules
//!
//! - [`config`] - Cognito pool/client configuration
//! - [`jwks`] - Signing key fetching and resolution
//! - [`verifier`] - Token verification pipeline
//! - [`middleware`] - HTTP extractors and error responses
//! - [`login`] - Cognito login client

pub mod config;
pub mod error;
pub mod jwks;
pub mod login;
pub mod middleware;
pub mod verifier;

pub use config::CognitoConfig;
pub use error::AuthError;
pub use jwks::{FetchConfig, JwksError, KeyResolver};
pub use login::{CognitoClient, LoginRequest, LoginResponse};
pub use middleware::{AuthState, BearerAuth, VerifiedClaims};
pub use verifier::{Claims, TokenVerifier, VerifierConfig, VerifyError};
