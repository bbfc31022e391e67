//! # Tether
//!
//! Fluent entry point for plain and TLS-layered outbound connections.
//!
//! ```no_run
//! use std::time::Duration;
//! use tether::{Tether, TlsSettings};
//!
//! let handle = Tether::tls(TlsSettings::new().with_alpn(["h2"]))
//!     .connect_timeout(Duration::from_secs(5))
//!     .nodelay(true)
//!     .connect("example.com", 443)?;
//! assert!(handle.is_secure());
//! # Ok::<(), tether::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

pub use builder::ConnectBuilder;

// Re-export the client types callers need alongside the builder
pub use tether_client::{
    AnySocketFactory, Connected, Error, FactoryIdentity, HandleCloser, HandleId, HandleState,
    Kind, LayeredSocketFactory, LocalBind, ParamSet, ParamValue, Params, PlainSocketFactory,
    Provenance, ReleaseProbe, Result, Scheme, SchemeRegistry, SocketFactory, TlsError,
    TlsSettings, TlsSocketFactory, TransportHandle, TrustAnchors,
};
pub use tether_client::config::keys;

/// Main entry point providing static builder constructors
pub struct Tether;

impl Tether {
    /// Builder connecting over plain TCP
    #[must_use]
    pub fn plain() -> ConnectBuilder {
        ConnectBuilder::plain()
    }

    /// Builder connecting over TLS
    ///
    /// # Arguments
    /// * `settings` - Trust anchors, ALPN protocols and SNI preference
    #[must_use]
    pub fn tls(settings: TlsSettings) -> ConnectBuilder {
        ConnectBuilder::tls(settings)
    }

    /// Builder connecting through an existing factory, such as one taken
    /// from a [`SchemeRegistry`]
    #[must_use]
    pub fn with_factory(factory: impl Into<AnySocketFactory>) -> ConnectBuilder {
        ConnectBuilder::with_factory(factory)
    }
}

/// Shorthand for [`Tether::plain`]
#[must_use]
pub fn plain() -> ConnectBuilder {
    ConnectBuilder::plain()
}

/// Shorthand for [`Tether::tls`]
#[must_use]
pub fn tls(settings: TlsSettings) -> ConnectBuilder {
    ConnectBuilder::tls(settings)
}
