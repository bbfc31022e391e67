//! Tether Client Prelude
//!
//! The types a connection manager needs to create and connect transports.

pub use crate::config::{ParamSet, Params, keys};
pub use crate::connect::{
    Connected, FactoryIdentity, HandleState, LayeredSocketFactory, LocalBind,
    PlainSocketFactory, Provenance, SocketFactory, TransportHandle,
};
pub use crate::error::{Error, Result};
pub use crate::scheme::{Scheme, SchemeRegistry};
pub use crate::tls::{TlsSettings, TlsSocketFactory, TrustAnchors};
