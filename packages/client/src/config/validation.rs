//! Parameter validation
//!
//! Checks raw parameter values before they are turned into socket options
//! or deadlines.

use super::params::ParamValue;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid buffer size: {0}")]
    InvalidBufferSize(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Parameter {key} expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Common parameter validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Upper bound accepted for socket buffer sizes (64 MiB).
    pub const MAX_BUFFER_SIZE: i64 = 64 * 1024 * 1024;

    /// Upper bound accepted for `SO_LINGER`, in seconds.
    pub const MAX_LINGER_SECS: i64 = 65_535;

    /// Validate a millisecond timeout. Zero means "no timeout" and is accepted.
    /// Deadlines too far out to represent are treated as unbounded.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if the value is negative.
    pub fn validate_timeout_millis(value: i64, name: &str) -> ConfigResult<()> {
        if value < 0 {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} cannot be negative ({value})"
            )));
        }

        Ok(())
    }

    /// Validate a socket buffer size.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidBufferSize` if the size is not
    /// positive or exceeds [`Self::MAX_BUFFER_SIZE`].
    pub fn validate_buffer_size(value: i64, name: &str) -> ConfigResult<()> {
        if value <= 0 {
            return Err(ConfigurationError::InvalidBufferSize(format!(
                "{name} must be positive ({value})"
            )));
        }

        if value > Self::MAX_BUFFER_SIZE {
            return Err(ConfigurationError::InvalidBufferSize(format!(
                "{name} cannot exceed 64MiB ({value})"
            )));
        }

        Ok(())
    }

    /// Validate a linger value. Negative disables linger, like the socket option.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` above [`Self::MAX_LINGER_SECS`].
    pub fn validate_linger_secs(value: i64, name: &str) -> ConfigResult<()> {
        if value > Self::MAX_LINGER_SECS {
            return Err(ConfigurationError::InvalidParameter(format!(
                "{name} cannot exceed {} seconds ({value})",
                Self::MAX_LINGER_SECS
            )));
        }
        Ok(())
    }

    pub(crate) fn expect_int(key: &str, value: &ParamValue) -> ConfigResult<i64> {
        match value {
            ParamValue::Int(v) => Ok(*v),
            other => Err(ConfigurationError::TypeMismatch {
                key: key.to_string(),
                expected: "integer",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn expect_bool(key: &str, value: &ParamValue) -> ConfigResult<bool> {
        match value {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(ConfigurationError::TypeMismatch {
                key: key.to_string(),
                expected: "boolean",
                found: other.type_name(),
            }),
        }
    }
}
