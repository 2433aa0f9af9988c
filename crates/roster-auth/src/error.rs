//! Authentication error types.

use crate::verifier::VerifyError;

/// Errors surfaced at the authentication boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request lacks usable authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The Bearer token failed verification.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Coarse description; the precise rejection reason is logged,
        /// not returned to the caller.
        message: String,
    },

    /// The identity provider rejected the supplied credentials.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The identity provider could not be reached or answered unusably.
    #[error("Identity provider error: {message}")]
    IdentityProvider {
        /// Description of the provider failure.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `IdentityProvider` error.
    #[must_use]
    pub fn identity_provider(message: impl Into<String>) -> Self {
        Self::IdentityProvider {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<VerifyError> for AuthError {
    fn from(_: VerifyError) -> Self {
        // Deliberately coarse: callers get one message for every
        // verification failure so responses cannot be used as an oracle.
        Self::invalid_token("invalid or expired token")
    }
}
