//! Error response handling for the authentication boundary.
//!
//! This module implements `IntoResponse` for [`AuthError`] so extractors
//! and handlers can return it directly. Bodies use the service's
//! `{"error": "..."}` shape; 401 responses carry a `WWW-Authenticate`
//! header.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = error_details(&self);

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"roster\""),
            );
        }

        (status, headers, Json(json!({ "error": message }))).into_response()
    }
}

/// Extracts the HTTP status and client-facing message from an error.
fn error_details(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message.clone()),
        AuthError::InvalidToken { message } => (StatusCode::UNAUTHORIZED, message.clone()),
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        ),
        AuthError::IdentityProvider { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to reach identity provider".to_string(),
        ),
        AuthError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server misconfiguration".to_string(),
        ),
    }
}
