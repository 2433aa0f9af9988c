//! Error types for record store operations.

/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists at the requested index.
    #[error("No record at index {index}")]
    NotFound {
        /// The index that was requested.
        index: usize,
    },

    /// The backing file could not be read or decoded.
    #[error("Failed to load record file: {message}")]
    Load {
        /// Description of the load failure.
        message: String,
    },

    /// The backing file could not be written.
    #[error("Failed to persist record file: {message}")]
    Persist {
        /// Description of the persist failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(index: usize) -> Self {
        Self::NotFound { index }
    }

    /// Creates a new `Load` error.
    #[must_use]
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Creates a new `Persist` error.
    #[must_use]
    pub fn persist(message: impl Into<String>) -> Self {
        Self::Persist {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found(3);
        assert_eq!(err.to_string(), "No record at index 3");

        let err = StoreError::load("no such file");
        assert_eq!(err.to_string(), "Failed to load record file: no such file");

        let err = StoreError::persist("disk full");
        assert_eq!(err.to_string(), "Failed to persist record file: disk full");
    }

    #[test]
    fn test_error_predicates() {
        assert!(StoreError::not_found(0).is_not_found());
        assert!(!StoreError::load("x").is_not_found());
        assert!(!StoreError::persist("x").is_not_found());
    }
}
