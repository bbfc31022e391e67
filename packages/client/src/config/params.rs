//! Read-only key/value parameters passed to every connect call
//!
//! Factories only ever read from a [`Params`]; the connection consumer owns
//! the concrete store. [`ParamSet`] is the reference implementation.

use std::fmt;
use std::time::Duration;

use hashbrown::HashMap;

use super::validation::{ConfigResult, ConfigValidator};

/// Well-known parameter keys.
pub mod keys {
    /// Connect deadline in milliseconds. `0` or absent means no deadline.
    pub const CONNECT_TIMEOUT_MILLIS: &str = "connectTimeoutMillis";
    /// Read timeout applied to the connected socket. `0` or absent means none.
    pub const SO_TIMEOUT_MILLIS: &str = "soTimeoutMillis";
    /// Disable Nagle's algorithm (defaults to `true`).
    pub const TCP_NODELAY: &str = "tcpNoDelay";
    /// Send and receive buffer size hint in bytes.
    pub const SOCKET_BUFFER_SIZE: &str = "socketBufferSize";
    /// `SO_LINGER` in seconds; negative disables it.
    pub const SO_LINGER_SECS: &str = "soLingerSecs";
    /// `SO_REUSEADDR`, useful together with a fixed local port.
    pub const SO_REUSE_ADDRESS: &str = "soReuseAddress";
    /// `SO_KEEPALIVE`.
    pub const SO_KEEPALIVE: &str = "soKeepAlive";
}

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "integer",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Text(_) => "text",
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Read-only parameter lookup used by socket factories.
///
/// Keys unknown to a factory are ignored.
pub trait Params: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<&ParamValue>;

    fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(ParamValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Hash map backed [`Params`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    values: HashMap<String, ParamValue>,
}

impl ParamSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Builder form of [`ParamSet::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set the connect deadline. A zero duration clears it.
    #[must_use]
    pub fn with_connect_timeout(self, timeout: Duration) -> Self {
        self.with(keys::CONNECT_TIMEOUT_MILLIS, duration_millis(timeout))
    }

    /// Set the read timeout applied once connected.
    #[must_use]
    pub fn with_so_timeout(self, timeout: Duration) -> Self {
        self.with(keys::SO_TIMEOUT_MILLIS, duration_millis(timeout))
    }

    /// Validate every well-known key present in the set.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` found.
    pub fn validate(&self) -> ConfigResult<()> {
        connect_timeout(self)?;
        super::socket::SocketOptions::from_params(self)?;
        Ok(())
    }
}

impl Params for ParamSet {
    fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }
}

/// Whole milliseconds, rounding a non-zero sub-millisecond duration up so it
/// never reads back as "no timeout".
fn duration_millis(timeout: Duration) -> i64 {
    let millis = timeout.as_millis().max(u128::from(!timeout.is_zero()));
    i64::try_from(millis).unwrap_or(i64::MAX)
}

/// Read the connect deadline from `params`.
///
/// Returns `None` when the key is absent or zero.
///
/// # Errors
///
/// Returns `ConfigurationError` for negative or non-integer values.
pub fn connect_timeout(params: &dyn Params) -> ConfigResult<Option<Duration>> {
    millis_param(params, keys::CONNECT_TIMEOUT_MILLIS)
}

/// Read the post-connect read timeout from `params`.
///
/// # Errors
///
/// Returns `ConfigurationError` for negative or non-integer values.
pub fn so_timeout(params: &dyn Params) -> ConfigResult<Option<Duration>> {
    millis_param(params, keys::SO_TIMEOUT_MILLIS)
}

fn millis_param(params: &dyn Params, key: &str) -> ConfigResult<Option<Duration>> {
    let Some(value) = params.get(key) else {
        return Ok(None);
    };
    let millis = ConfigValidator::expect_int(key, value)?;
    ConfigValidator::validate_timeout_millis(millis, key)?;
    if millis == 0 {
        return Ok(None);
    }
    Ok(Some(Duration::from_millis(millis.unsigned_abs())))
}
