//! Cognito login client.
//!
//! Login delegates credential verification entirely to the Cognito IDP
//! endpoint via the `USER_PASSWORD_AUTH` flow; no token verification
//! happens on this path. When the app client has a secret, each request
//! carries a `SECRET_HASH` keyed hash of the username and client ID.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use url::Url;

use crate::config::CognitoConfig;
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";

/// A login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The token bundle returned on a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: String,
    refresh_token: String,
    expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
struct CognitoErrorResponse {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

/// Client for the Cognito IDP login endpoint.
pub struct CognitoClient {
    http_client: reqwest::Client,
    endpoint: Url,
    client_id: String,
    client_secret: String,
}

impl CognitoClient {
    /// Creates a client for the pool's regional endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the endpoint URL cannot
    /// be built from the configured region.
    pub fn new(config: &CognitoConfig) -> Result<Self, AuthError> {
        let endpoint = Url::parse(&config.auth_endpoint())
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        Ok(Self {
            http_client: reqwest::Client::new(),
            endpoint,
            client_id: config.app_client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// Overrides the IDP endpoint. This should only be used for testing.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Runs the `USER_PASSWORD_AUTH` flow for the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the issuer rejects
    /// the credentials and [`AuthError::IdentityProvider`] when it cannot
    /// be reached or answers unusably.
    pub async fn initiate_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthError> {
        let mut auth_parameters = json!({
            "USERNAME": username,
            "PASSWORD": password,
        });
        if !self.client_secret.is_empty() {
            auth_parameters["SECRET_HASH"] =
                json!(secret_hash(username, &self.client_id, &self.client_secret));
        }

        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": auth_parameters,
        });
        let payload =
            serde_json::to_string(&body).map_err(|e| AuthError::identity_provider(e.to_string()))?;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", INITIATE_AUTH_TARGET)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to reach Cognito IDP endpoint");
                AuthError::identity_provider(e.to_string())
            })?;

        let status = response.status();
        if status.is_client_error() {
            let err: CognitoErrorResponse = response.json().await.unwrap_or_default();
            tracing::debug!(
                error_type = %err.error_type,
                message = %err.message,
                "authentication rejected by issuer"
            );
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AuthError::identity_provider(format!(
                "unexpected status {status}"
            )));
        }

        let out: InitiateAuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::identity_provider(e.to_string()))?;
        let result = out
            .authentication_result
            .ok_or_else(|| AuthError::identity_provider("response missing AuthenticationResult"))?;

        Ok(LoginResponse {
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            expires_in: result.expires_in,
        })
    }
}

/// Computes `SECRET_HASH = base64(hmac_sha256(secret, username + client_id))`.
fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
