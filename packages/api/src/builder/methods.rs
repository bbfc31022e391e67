//! Terminal methods that run the connect
//!
//! Every terminal method consumes the builder, builds the selected factory
//! and delegates to it.

use tether_client::error;
use tether_client::{
    AnySocketFactory, Connected, LayeredSocketFactory, PlainSocketFactory, Result,
    SocketFactory, TlsSocketFactory, TransportHandle,
};

use super::core::{ConnectBuilder, FactoryChoice};

impl ConnectBuilder {
    /// Build the factory this builder connects through.
    ///
    /// # Errors
    ///
    /// Returns `SecureHandshake` when the TLS configuration cannot be built.
    pub fn factory(&self) -> Result<AnySocketFactory> {
        match &self.factory {
            FactoryChoice::Plain => Ok(PlainSocketFactory.into()),
            FactoryChoice::Tls(settings) => Ok(TlsSocketFactory::new(settings.clone())?.into()),
            FactoryChoice::Ready(factory) => Ok(factory.clone()),
        }
    }

    /// Connect to `host:port` on a fresh socket.
    ///
    /// # Errors
    ///
    /// Any connect error of the underlying factory.
    pub fn connect(self, host: &str, port: u16) -> Result<TransportHandle> {
        self.connect_with(None, host, port).map(Connected::into_handle)
    }

    /// Connect using `handle` when given. The returned provenance tells
    /// whether that handle was reused or wrapped.
    ///
    /// # Errors
    ///
    /// Any connect error of the underlying factory. The given handle is
    /// released on failure.
    pub fn connect_with(
        self,
        handle: Option<TransportHandle>,
        host: &str,
        port: u16,
    ) -> Result<Connected> {
        let factory = self.factory()?;
        if self.debug_enabled {
            tracing::debug!(
                target: "tether::builder",
                identity = ?factory.identity(),
                host,
                port,
                local = ?self.local,
                reuse = handle.is_some(),
                "Connect builder: connecting"
            );
        }

        let result = factory.connect_socket(handle, host, port, self.local, &self.params);
        if self.debug_enabled {
            match &result {
                Ok(connected) => tracing::debug!(
                    target: "tether::builder",
                    handle = %connected.handle.id(),
                    provenance = ?connected.provenance,
                    "Connect builder: connected"
                ),
                Err(e) => tracing::debug!(
                    target: "tether::builder",
                    error = %e,
                    "Connect builder: connect failed"
                ),
            }
        }
        result
    }

    /// Layer the builder's factory over an already connected handle.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the factory does not layer, otherwise any
    /// layering error. `handle` is released on failure.
    pub fn layer(self, handle: TransportHandle, host: &str, port: u16) -> Result<TransportHandle> {
        let factory = self.factory()?;
        let Some(layered) = factory.as_layered() else {
            drop(handle);
            return Err(error::invalid_argument(
                "plain factory cannot layer over an existing connection",
            ));
        };
        if self.debug_enabled {
            tracing::debug!(
                target: "tether::builder",
                base = %handle.id(),
                host,
                port,
                "Connect builder: layering"
            );
        }
        layered.layer(handle, host, port, &self.params)
    }
}
