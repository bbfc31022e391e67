//! # Tether Client
//!
//! Outbound connection factories for HTTP connection managers.
//!
//! A connection manager creates and connects transports only through the
//! [`SocketFactory`] contract, so plain TCP, TLS and other layered transports
//! can be swapped without touching pooling code.
//!
//! ## Features
//!
//! - **Deadline-bounded connects** covering resolution, TCP connect and handshake
//! - **Rustls TLS layering** with webpki, native or custom roots
//! - **Structural factory identity** for partitioning connection pools
//! - **Leak-free failure paths** observable through release probes
//!
//! ## Usage
//!
//! ```no_run
//! use tether_client::prelude::*;
//!
//! let params = ParamSet::new().with_connect_timeout(std::time::Duration::from_secs(5));
//! let connected = PlainSocketFactory.connect_socket(None, "example.com", 80, None, &params)?;
//! assert_eq!(connected.handle.state(), HandleState::Connected);
//! # Ok::<(), tether_client::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod connect;
pub mod error;
pub mod prelude;
pub mod scheme;
pub mod telemetry;
pub mod tls;

pub use config::{ParamSet, ParamValue, Params, SocketOptions};
pub use connect::{
    Connected, Endpoint, FactoryIdentity, HandleCloser, HandleId, HandleState,
    LayeredSocketFactory, LocalBind, PlainSocketFactory, Provenance, ReleaseProbe, SocketFactory,
    TransportHandle,
};
pub use error::{Error, Kind, Result};
pub use scheme::{AnySocketFactory, Scheme, SchemeRegistry};
pub use telemetry::{ConnectStats, ConnectStatsSnapshot};
pub use tls::{TlsError, TlsSettings, TlsSocketFactory, TrustAnchors};
