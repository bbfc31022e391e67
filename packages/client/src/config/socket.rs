//! Socket options derived from connect parameters

use std::time::Duration;

use super::params::{keys, so_timeout, Params};
use super::validation::{ConfigResult, ConfigValidator};

/// Typed view of the socket-level keys of a [`Params`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    pub nodelay: bool,
    pub so_timeout: Option<Duration>,
    pub buffer_size: Option<usize>,
    pub linger: Option<Duration>,
    pub reuse_address: bool,
    pub keepalive: bool,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            nodelay: true,
            so_timeout: None,
            buffer_size: None,
            linger: None,
            reuse_address: false,
            keepalive: false,
        }
    }
}

impl SocketOptions {
    /// Read socket options from `params`, falling back to defaults for
    /// absent keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` when a present key has the wrong type or
    /// an out-of-range value.
    pub fn from_params(params: &dyn Params) -> ConfigResult<Self> {
        let mut options = Self::default();

        if let Some(value) = params.get(keys::TCP_NODELAY) {
            options.nodelay = ConfigValidator::expect_bool(keys::TCP_NODELAY, value)?;
        }

        options.so_timeout = so_timeout(params)?;

        if let Some(value) = params.get(keys::SOCKET_BUFFER_SIZE) {
            let size = ConfigValidator::expect_int(keys::SOCKET_BUFFER_SIZE, value)?;
            ConfigValidator::validate_buffer_size(size, keys::SOCKET_BUFFER_SIZE)?;
            options.buffer_size = usize::try_from(size).ok();
        }

        if let Some(value) = params.get(keys::SO_LINGER_SECS) {
            let secs = ConfigValidator::expect_int(keys::SO_LINGER_SECS, value)?;
            ConfigValidator::validate_linger_secs(secs, keys::SO_LINGER_SECS)?;
            options.linger = u64::try_from(secs).ok().map(Duration::from_secs);
        }

        if let Some(value) = params.get(keys::SO_REUSE_ADDRESS) {
            options.reuse_address = ConfigValidator::expect_bool(keys::SO_REUSE_ADDRESS, value)?;
        }

        if let Some(value) = params.get(keys::SO_KEEPALIVE) {
            options.keepalive = ConfigValidator::expect_bool(keys::SO_KEEPALIVE, value)?;
        }

        Ok(options)
    }
}
