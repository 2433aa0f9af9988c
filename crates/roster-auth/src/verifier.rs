//! Token verification pipeline.
//!
//! Verification runs a fixed sequence of checks, each with its own
//! rejection reason: structural header parse and algorithm allow-list,
//! key lookup by `kid`, signature and time-bound validation, claim
//! decoding, then exact audience and issuer matching. The algorithm
//! check runs before any key lookup or signature work, which defends
//! against algorithm-substitution attacks.
//!
//! Verification is deterministic given a fixed key set and wall-clock
//! time and has no side effects.

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde_json::Value;

use crate::config::CognitoConfig;
use crate::jwks::{JwksError, KeyResolver};

/// Decoded claim set of a verified token.
pub type Claims = serde_json::Map<String, Value>;

/// Reasons a token can be rejected.
///
/// Handlers must not echo these to clients verbatim; they collapse into
/// one coarse message at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The token is structurally invalid.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The token uses an algorithm outside the RSA family.
    #[error("Unexpected signing algorithm: {0:?}")]
    UnexpectedAlgorithm(Algorithm),

    /// The token header carries no key ID.
    #[error("Token missing kid header")]
    MissingKeyId,

    /// No key with the token's key ID exists in the key set.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The signature does not match the resolved key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token's `exp` claim is in the past.
    #[error("Token expired")]
    Expired,

    /// The token's `nbf` claim is in the future.
    #[error("Token not yet valid")]
    NotYetValid,

    /// The claims cannot be decoded as a JSON object.
    #[error("Token claims are not an object")]
    ClaimsMalformed,

    /// The `aud` claim is missing or matches no configured audience.
    #[error("Audience mismatch")]
    AudienceMismatch,

    /// The `iss` claim does not name the configured user pool.
    #[error("Issuer mismatch")]
    IssuerMismatch,
}

/// Configuration the verifier checks claims against.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// AWS region hosting the user pool.
    pub region: String,

    /// User pool identifier.
    pub user_pool_id: String,

    /// Expected `aud` for ID tokens. Empty disables this audience.
    pub app_client_id: String,

    /// Expected `aud` for access tokens. Empty disables this audience.
    pub resource_server_id: String,
}

impl VerifierConfig {
    /// Returns the issuer URL tokens must carry.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }
}

impl From<&CognitoConfig> for VerifierConfig {
    fn from(cfg: &CognitoConfig) -> Self {
        Self {
            region: cfg.region.clone(),
            user_pool_id: cfg.user_pool_id.clone(),
            app_client_id: cfg.app_client_id.clone(),
            resource_server_id: cfg.resource_server_id.clone(),
        }
    }
}

/// Verifies Bearer tokens against an immutable key set.
///
/// Thread-safe; verification is a pure read over the resolver.
pub struct TokenVerifier {
    config: VerifierConfig,
    issuer: String,
    resolver: KeyResolver,
}

impl TokenVerifier {
    /// Creates a verifier over the given key set.
    #[must_use]
    pub fn new(config: VerifierConfig, resolver: KeyResolver) -> Self {
        let issuer = config.issuer();
        Self {
            config,
            issuer,
            resolver,
        }
    }

    /// Verifies a token and returns its full claim set.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as a [`VerifyError`].
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        if !is_rsa(header.alg) {
            return Err(VerifyError::UnexpectedAlgorithm(header.alg));
        }

        let kid = header.kid.as_deref().ok_or(VerifyError::MissingKeyId)?;

        let (key, key_alg) = self.resolver.resolve(kid).map_err(|e| match e {
            JwksError::KeyNotFound(kid) => VerifyError::KeyNotFound(kid),
            other => VerifyError::Malformed(other.to_string()),
        })?;

        // A key published for a different algorithm must not validate
        // this token even if the header's algorithm is acceptable.
        if let Some(key_alg) = key_alg
            && key_alg != header.alg
        {
            return Err(VerifyError::UnexpectedAlgorithm(header.alg));
        }

        let mut validation = Validation::new(header.alg);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Audience is matched exactly below, against either configured value.
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &key, &validation).map_err(map_decode_error)?;
        let claims = data.claims;

        self.check_audience(&claims)?;
        self.check_issuer(&claims)?;

        Ok(claims)
    }

    fn check_audience(&self, claims: &Claims) -> Result<(), VerifyError> {
        let allowed = [
            self.config.app_client_id.as_str(),
            self.config.resource_server_id.as_str(),
        ];
        if allowed.iter().all(|id| id.is_empty()) {
            return Ok(());
        }

        match claims.get("aud").and_then(Value::as_str) {
            Some(aud) if allowed.iter().any(|id| !id.is_empty() && aud == *id) => Ok(()),
            _ => Err(VerifyError::AudienceMismatch),
        }
    }

    fn check_issuer(&self, claims: &Claims) -> Result<(), VerifyError> {
        match claims.get("iss").and_then(Value::as_str) {
            Some(iss) if iss == self.issuer => Ok(()),
            _ => Err(VerifyError::IssuerMismatch),
        }
    }
}

fn is_rsa(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512)
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> VerifyError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
        ErrorKind::Json(_) => VerifyError::ClaimsMalformed,
        _ => VerifyError::Malformed(err.to_string()),
    }
}
