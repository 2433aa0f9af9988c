//! Signing key fetching and resolution.
//!
//! The trusted issuer publishes its RSA public keys as a JSON Web Key
//! Set at a well-known HTTPS path. [`KeyResolver::fetch`] retrieves that
//! document once, at startup; the service must not start serving if the
//! fetch fails, because no token can be verified without the keys.
//!
//! The resulting key set is immutable. A key ID that is absent resolves
//! to [`JwksError::KeyNotFound`] and stays absent until the process
//! restarts; the issuer rotating its keys requires a restart. Lookups
//! are pure reads and safe for unlimited concurrent callers.

use std::time::Duration;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey};
use url::Url;

/// Configuration for the startup JWKS fetch.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// HTTP request timeout (default: 10 seconds).
    pub request_timeout: Duration,

    /// Maximum response size in bytes (default: 1 MB).
    pub max_response_size: usize,

    /// Whether to allow HTTP (non-HTTPS) JWKS URLs.
    /// This should only be enabled for testing.
    pub allow_http: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024,
            allow_http: false,
        }
    }
}

impl FetchConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum response size.
    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Allows HTTP (non-HTTPS) JWKS URLs.
    ///
    /// # Warning
    ///
    /// This should only be used for testing. In production, JWKS
    /// endpoints should always use HTTPS.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }
}

/// Errors that can occur during JWKS operations.
#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    /// A network error occurred while fetching the JWKS.
    #[error("Network error: {0}")]
    Network(String),

    /// The HTTP request returned a non-success status code.
    #[error("HTTP error: status {0}")]
    Http(u16),

    /// The JWKS response could not be parsed as JSON.
    #[error("Failed to parse JWKS: {0}")]
    Parse(String),

    /// The requested key was not found in the key set.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The key could not be converted to a decoding key.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The JWKS URL scheme is not allowed (must be HTTPS in production).
    #[error("Invalid URL scheme: only HTTPS is allowed")]
    InvalidScheme,

    /// The response exceeded the maximum allowed size.
    #[error("Response exceeds maximum size of {max_size} bytes")]
    ResponseTooLarge {
        /// The maximum allowed size.
        max_size: usize,
    },
}

/// Immutable key set fetched from the issuer at startup.
///
/// Holds the issuer's public signing keys keyed by `kid`. Built once;
/// never refreshed in place.
#[derive(Debug)]
pub struct KeyResolver {
    keys: JwkSet,
}

impl KeyResolver {
    /// Fetches the JWKS document from `jwks_url` and builds a resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL scheme is not HTTPS (unless `allow_http` is configured)
    /// - The HTTP request fails or returns a non-success status
    /// - The response is oversized or cannot be parsed as a JWKS
    pub async fn fetch(jwks_url: &Url, config: &FetchConfig) -> Result<Self, JwksError> {
        validate_scheme(jwks_url, config)?;

        tracing::debug!("Fetching JWKS from {}", jwks_url);

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| JwksError::Network(e.to_string()))?;

        let response = http_client
            .get(jwks_url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch JWKS from {}: {}", jwks_url, e);
                JwksError::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(JwksError::Http(response.status().as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > config.max_response_size
        {
            return Err(JwksError::ResponseTooLarge {
                max_size: config.max_response_size,
            });
        }

        let keys: JwkSet = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse JWKS from {}: {}", jwks_url, e);
            JwksError::Parse(e.to_string())
        })?;

        tracing::debug!("Fetched JWKS from {} with {} keys", jwks_url, keys.keys.len());

        Ok(Self { keys })
    }

    /// Builds a resolver directly from a key set, bypassing the fetch.
    #[must_use]
    pub fn from_jwk_set(keys: JwkSet) -> Self {
        Self { keys }
    }

    /// Looks up the signing key with the given key ID.
    ///
    /// Returns the decoding key and, when the JWK declares one, its
    /// algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeyNotFound`] if no key carries `kid`, or
    /// [`JwksError::InvalidKey`] if the key cannot be converted.
    pub fn resolve(&self, kid: &str) -> Result<(DecodingKey, Option<Algorithm>), JwksError> {
        let jwk = self
            .keys
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))?;

        let key = DecodingKey::from_jwk(jwk).map_err(|e| JwksError::InvalidKey(e.to_string()))?;
        Ok((key, jwk_algorithm(jwk)))
    }

    /// Returns the number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.keys.len()
    }

    /// Returns `true` if the key set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.keys.is_empty()
    }
}

/// Validates that the URL uses an allowed scheme.
fn validate_scheme(url: &Url, config: &FetchConfig) -> Result<(), JwksError> {
    let scheme = url.scheme();

    if scheme == "https" {
        return Ok(());
    }

    if scheme == "http" && config.allow_http {
        return Ok(());
    }

    Err(JwksError::InvalidScheme)
}

/// Extracts the algorithm from a JWK.
fn jwk_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    jwk.common.key_algorithm.as_ref().and_then(|alg| match alg {
        jsonwebtoken::jwk::KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        jsonwebtoken::jwk::KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        jsonwebtoken::jwk::KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        _ => None,
    })
}
