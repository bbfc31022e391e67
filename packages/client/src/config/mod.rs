//! Connect-time configuration
//!
//! Parameters are read-only for the factories: the connection consumer builds
//! a [`ParamSet`] (or its own [`Params`]) and passes it to every connect call.

pub mod params;
pub mod socket;
pub mod validation;

// Re-export all configuration types for easy access
pub use params::{ParamSet, ParamValue, Params, connect_timeout, keys, so_timeout};
pub use socket::SocketOptions;
pub use validation::{ConfigResult, ConfigValidator, ConfigurationError};
