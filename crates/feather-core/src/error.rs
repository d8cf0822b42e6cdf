//! Core error types for Feather.
//!
//! Each subsystem error is represented as a variant for clear error propagation.

use thiserror::Error;

/// Central error type for Feather operations.
#[derive(Error, Debug)]
pub enum FeatherError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Authentication errors surfaced outside the auth crate
    #[error("authentication error: {0}")]
    Auth(String),

    /// Credential storage errors
    #[error("storage error: {0}")]
    Storage(String),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `FeatherError`.
pub type Result<T> = std::result::Result<T, FeatherError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeatherError::Validation("empty token".to_string());
        assert_eq!(err.to_string(), "validation error: empty token");

        let err = ConfigError::InvalidValue {
            field: "auth.session_timeout_secs".to_string(),
            reason: "must be greater than zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for auth.session_timeout_secs: must be greater than zero"
        );
    }

    #[test]
    fn test_error_from_config() {
        let feather_err: FeatherError = ConfigError::NoConfigDir.into();
        assert!(matches!(feather_err, FeatherError::Config(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let feather_err: FeatherError = io_err.into();
        assert!(matches!(feather_err, FeatherError::Io(_)));
    }
}
