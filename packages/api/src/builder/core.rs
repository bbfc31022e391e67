//! Core `ConnectBuilder` structure and its configuration methods
//!
//! The builder accumulates a parameter set and local-bind preference, then
//! hands both to the selected socket factory in a terminal method.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use tether_client::config::keys;
use tether_client::{AnySocketFactory, LocalBind, ParamSet, ParamValue, TlsSettings};

/// Which factory the builder connects through.
#[derive(Debug, Clone)]
pub(crate) enum FactoryChoice {
    Plain,
    /// Built lazily so configuration errors surface from `connect`
    Tls(TlsSettings),
    Ready(AnySocketFactory),
}

/// Fluent builder for one outbound connection
#[derive(Clone)]
pub struct ConnectBuilder {
    pub(crate) factory: FactoryChoice,
    pub(crate) params: ParamSet,
    pub(crate) local: Option<LocalBind>,
    /// Debug logging enabled flag
    pub(crate) debug_enabled: bool,
}

impl ConnectBuilder {
    pub(crate) fn with_choice(factory: FactoryChoice) -> Self {
        Self {
            factory,
            params: ParamSet::new(),
            local: None,
            debug_enabled: false,
        }
    }

    /// Builder over plain TCP
    #[must_use]
    pub fn plain() -> Self {
        Self::with_choice(FactoryChoice::Plain)
    }

    /// Builder over TLS with the given settings
    #[must_use]
    pub fn tls(settings: TlsSettings) -> Self {
        Self::with_choice(FactoryChoice::Tls(settings))
    }

    /// Builder over an existing factory
    #[must_use]
    pub fn with_factory(factory: impl Into<AnySocketFactory>) -> Self {
        Self::with_choice(FactoryChoice::Ready(factory.into()))
    }

    /// Enable debug logging for this connect
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug_enabled = true;
        self
    }

    /// Deadline for resolution, connect and handshake together.
    /// A zero duration means no deadline.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.params = self.params.with_connect_timeout(timeout);
        self
    }

    /// Read timeout applied to the connected socket
    #[must_use]
    pub fn so_timeout(mut self, timeout: Duration) -> Self {
        self.params = self.params.with_so_timeout(timeout);
        self
    }

    #[must_use]
    pub fn nodelay(self, enabled: bool) -> Self {
        self.param(keys::TCP_NODELAY, enabled)
    }

    /// Bind the given local address (any port) before connecting
    #[must_use]
    pub fn bind(mut self, address: IpAddr) -> Self {
        let port = self.local.map_or(0, |local| local.port);
        self.local = Some(LocalBind::new(Some(address), port));
        self
    }

    /// Bind the given local port before connecting. Zero or negative means any.
    #[must_use]
    pub fn bind_port(mut self, port: i32) -> Self {
        let address = self.local.and_then(|local| local.address);
        self.local = Some(LocalBind::new(address, port));
        self
    }

    /// Set an arbitrary connect parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.set(key, value);
        self
    }

    /// The parameters the connect will run with
    #[must_use]
    pub fn params(&self) -> &ParamSet {
        &self.params
    }
}

impl fmt::Debug for ConnectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectBuilder")
            .field("factory", &self.factory)
            .field("params", &self.params)
            .field("local", &self.local)
            .field("debug_enabled", &self.debug_enabled)
            .finish()
    }
}
