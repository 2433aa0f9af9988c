//! HTTP middleware for authentication.
//!
//! - [`auth`] - Bearer token extractor gating protected routes
//! - [`error`] - error responses for rejected requests

pub mod auth;
pub mod error;

pub use auth::{AuthState, BearerAuth, VerifiedClaims};
