//! Configuration error types

use std::io;

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - required field missing
    #[error("section '{section}' is missing required field '{field}'")]
    MissingField {
        /// Config section (e.g. "sender")
        section: &'static str,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("section '{section}' has invalid {field}: {message}")]
    InvalidValue {
        /// Config section
        section: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::MissingField {
            section: "sender",
            field: "target",
        };
        assert!(err.to_string().contains("sender"));
        assert!(err.to_string().contains("target"));

        let err = ConfigError::InvalidValue {
            section: "gateway",
            field: "pool_size",
            message: "must be at least 1".into(),
        };
        assert!(err.to_string().contains("pool_size"));
    }
}
