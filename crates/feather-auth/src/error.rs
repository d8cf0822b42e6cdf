//! Error types for developer-mode authentication.

use thiserror::Error;

/// Authentication errors.
///
/// Mismatches and validation failures are normally reported through the
/// engine's `last_error` field and a `bool` return; these variants exist for
/// the operations that return `Result` and for callers that want to match on
/// a failure class.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Passcode shorter than the configured minimum
    #[error("Passcode must be at least {min} characters")]
    PasscodeTooShort {
        /// Minimum accepted length in characters
        min: usize,
    },

    /// No passcode has been configured yet
    #[error("No passcode set")]
    NotConfigured,

    /// Passcode or developer token did not match
    #[error("credential mismatch")]
    CredentialMismatch,

    /// Biometrics not available on this device
    #[error("Biometrics not available")]
    BiometricUnavailable,

    /// The platform rejected the biometric challenge
    #[error("biometric authentication denied: {0}")]
    BiometricDenied(String),

    /// A biometric challenge is already outstanding
    #[error("Biometric authentication already in progress")]
    BiometricInProgress,

    /// Underlying credential or preference store failed
    #[error("credential store failure: {0}")]
    Store(#[from] StoreError),

    /// Developer mode is locked
    #[error("developer mode is locked")]
    NotAuthenticated,
}

/// Errors raised by credential and key/value store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),

    /// I/O error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<AuthError> for feather_core::FeatherError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(store) => Self::Storage(store.to_string()),
            other => Self::Auth(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::PasscodeTooShort { min: 6 }.to_string(),
            "Passcode must be at least 6 characters"
        );
        assert_eq!(AuthError::NotConfigured.to_string(), "No passcode set");
        assert_eq!(
            AuthError::Store(StoreError::Backend("keychain offline".into())).to_string(),
            "credential store failure: keychain offline"
        );
    }

    #[test]
    fn test_into_core_error() {
        let err: feather_core::FeatherError =
            AuthError::Store(StoreError::Backend("x".into())).into();
        assert!(matches!(err, feather_core::FeatherError::Storage(_)));

        let err: feather_core::FeatherError = AuthError::NotAuthenticated.into();
        assert!(matches!(err, feather_core::FeatherError::Auth(_)));
    }
}
