//! TCP connection establishment
//!
//! Deadline-bounded resolution and connect, socket configuration, and the
//! plain socket factory built on them.

pub(crate) mod dns;
pub mod plain;
pub(crate) mod socket_config;

pub use plain::PlainSocketFactory;
pub(crate) use plain::{ConnectRequest, connect_plain};
