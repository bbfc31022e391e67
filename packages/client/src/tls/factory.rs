//! TLS socket factory
//!
//! Connects a plain transport first, then layers a rustls client session on
//! it. The secure handle is new; the plain handle it wraps is consumed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use socket2::Domain;

use super::errors::TlsError;
use super::handshake::handshake;
use super::settings::TlsSettings;
use crate::config::Params;
use crate::connect::factory::{
    Connected, FactoryIdentity, LayeredSocketFactory, Provenance, SocketFactory,
};
use crate::connect::tcp::{ConnectRequest, connect_plain};
use crate::connect::{Endpoint, LocalBind, TransportHandle};
use crate::error::{self, Result};
use crate::telemetry::ConnectStats;

/// Factory for TLS transports.
///
/// Two factories are equal iff their settings are equal. The rustls
/// configuration is built once, when the factory is created.
#[derive(Clone)]
pub struct TlsSocketFactory {
    settings: TlsSettings,
    config: Arc<ClientConfig>,
}

impl TlsSocketFactory {
    /// # Errors
    ///
    /// Returns a `TlsError` when the settings cannot produce a client
    /// configuration (e.g. no usable trust anchor).
    pub fn new(settings: TlsSettings) -> std::result::Result<Self, TlsError> {
        let config = settings.client_config()?;
        Ok(Self { settings, config })
    }

    #[must_use]
    pub fn settings(&self) -> &TlsSettings {
        &self.settings
    }

    /// Handshake over the connected plain `base`, consuming it.
    fn wrap(&self, mut base: TransportHandle, request: &ConnectRequest) -> Result<TransportHandle> {
        let with_endpoint = |e: error::Error| e.with_endpoint(request.endpoint.clone());

        let server_name = server_name(&request.endpoint).map_err(with_endpoint)?;
        let base_id = base.id();
        let lineage = Arc::clone(base.lineage());
        let (stream, lease) = base.detach_plain().map_err(with_endpoint)?;
        drop(base);

        lineage.arm_interrupt(&stream);
        tracing::debug!(
            handle = %base_id,
            host = %request.endpoint.host(),
            port = request.endpoint.port(),
            "Starting TLS handshake"
        );

        match handshake(
            Arc::clone(&self.config),
            server_name,
            stream,
            request.deadline,
            &lineage,
        ) {
            Ok(tls) => {
                ConnectStats::global().record_handshake(true);
                let secure = TransportHandle::secure(lineage, tls, lease);
                tracing::debug!(base = %base_id, handle = %secure.id(), "Transport secured");
                Ok(secure)
            }
            Err(e) => {
                ConnectStats::global().record_handshake(false);
                tracing::debug!(handle = %base_id, "TLS handshake failed: {}", e);
                // The stream is gone already; release its accounting and close the lineage.
                lineage.close();
                drop(lease);
                Err(with_endpoint(e))
            }
        }
    }
}

fn server_name(endpoint: &Endpoint) -> Result<ServerName<'static>> {
    ServerName::try_from(endpoint.bare_host())
        .map(|name| name.to_owned())
        .map_err(|e| {
            error::invalid_argument(TlsError::InvalidServerName(format!(
                "{}: {e}",
                endpoint.bare_host()
            )))
        })
}

impl SocketFactory for TlsSocketFactory {
    fn identity(&self) -> FactoryIdentity {
        FactoryIdentity::Layered(self.settings.clone())
    }

    fn create_socket(&self) -> Result<TransportHandle> {
        TransportHandle::unconnected(Domain::IPV4)
    }

    fn connect_socket(
        &self,
        handle: Option<TransportHandle>,
        host: &str,
        port: u16,
        local: Option<LocalBind>,
        params: &dyn Params,
    ) -> Result<Connected> {
        let result = ConnectRequest::new(host, port, local, params).and_then(|request| {
            let base = connect_plain(handle, &request)?.into_handle();
            let base_id = base.id();
            let handle = self.wrap(base, &request)?;
            Ok(Connected {
                handle,
                provenance: Provenance::Wrapped { base: base_id },
            })
        });
        ConnectStats::global().record_connect(&result);
        result
    }
}

impl LayeredSocketFactory for TlsSocketFactory {
    fn layer(
        &self,
        handle: TransportHandle,
        host: &str,
        port: u16,
        params: &dyn Params,
    ) -> Result<TransportHandle> {
        let request = ConnectRequest::new(host, port, None, params)?;
        self.wrap(handle, &request)
    }
}

impl PartialEq for TlsSocketFactory {
    fn eq(&self, other: &Self) -> bool {
        self.settings == other.settings
    }
}

impl Eq for TlsSocketFactory {}

impl Hash for TlsSocketFactory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for TlsSocketFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSocketFactory")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;
    use crate::config::ParamSet;
    use crate::connect::PlainSocketFactory;
    use crate::tls::TrustAnchors;

    fn accept_any() -> TlsSocketFactory {
        TlsSocketFactory::new(TlsSettings::new().with_trust(TrustAnchors::AcceptAny))
            .expect("factory")
    }

    #[test]
    fn identity_follows_settings() {
        let a = accept_any();
        let b = accept_any();
        let c = TlsSocketFactory::new(TlsSettings::new()).expect("webpki factory");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.identity(), FactoryIdentity::Plain);
        assert!(a.identity().is_layered());
    }

    #[test]
    fn layer_rejects_unconnected_handle() {
        let factory = accept_any();
        let handle = factory.create_socket().expect("socket");
        let probe = handle.release_probe();

        let err = factory
            .layer(handle, "localhost", 443, &ParamSet::new())
            .expect_err("not connected");
        assert!(err.is_invalid_argument());
        assert!(probe.is_released());
    }

    #[test]
    fn handshake_with_silent_peer_closes_base() {
        // A peer that accepts and hangs up without speaking TLS.
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener");
        let port = listener.local_addr().expect("addr").port();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            drop(stream);
        });

        let base = PlainSocketFactory
            .connect_socket(None, "127.0.0.1", port, None, &ParamSet::new())
            .expect("plain connect")
            .into_handle();
        let probe = base.release_probe();
        let closer = base.closer();
        let params = ParamSet::new().with_connect_timeout(std::time::Duration::from_secs(5));

        let err = accept_any()
            .layer(base, "localhost", port, &params)
            .expect_err("peer hung up");
        server.join().expect("server thread");

        assert!(err.is_secure_handshake());
        assert!(probe.is_released());
        assert!(closer.is_closed());
    }
}
