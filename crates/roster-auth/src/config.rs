//! Cognito pool and client configuration.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Configuration for a Cognito user pool and app client.
///
/// `resource_server_id` and `client_secret` are optional; empty strings
/// mean "not configured". When `client_secret` is set, login requests
/// carry a `SECRET_HASH` computed from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CognitoConfig {
    /// AWS region hosting the user pool, e.g. `eu-west-1`.
    pub region: String,

    /// User pool identifier, e.g. `eu-west-1_AbCdEfGhI`.
    pub user_pool_id: String,

    /// App client identifier; verified against the `aud` claim of ID tokens.
    pub app_client_id: String,

    /// Resource server identifier; verified against the `aud` claim of
    /// access tokens. Empty when unused.
    #[serde(default)]
    pub resource_server_id: String,

    /// App client secret. Empty when the client has no secret.
    #[serde(default, skip_serializing)]
    pub client_secret: String,
}

impl CognitoConfig {
    /// Returns the issuer URL tokens from this pool must carry.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Returns the well-known JWKS document URL for this pool.
    #[must_use]
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }

    /// Returns the regional Cognito IDP endpoint used for login calls.
    #[must_use]
    pub fn auth_endpoint(&self) -> String {
        format!("https://cognito-idp.{}.amazonaws.com/", self.region)
    }

    /// Validates that the required fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] naming the missing field.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.region.is_empty() {
            return Err(AuthError::configuration("region must not be empty"));
        }
        if self.user_pool_id.is_empty() {
            return Err(AuthError::configuration("user_pool_id must not be empty"));
        }
        if self.app_client_id.is_empty() {
            return Err(AuthError::configuration("app_client_id must not be empty"));
        }
        Ok(())
    }
}
