//! Plain TCP socket factory
//!
//! Resolution and every connect attempt run under one deadline. Addresses
//! are tried in order; a failed attempt's socket is dropped before the next
//! one is allocated, so no half-open socket outlives the call.

use std::hash::{Hash, Hasher};
use std::net::{SocketAddr, TcpStream};

use socket2::{Domain, Socket};

use super::{dns, socket_config};
use crate::config::{self, Params, SocketOptions};
use crate::connect::deadline::{self, Deadline};
use crate::connect::endpoint::{Endpoint, LocalBind};
use crate::connect::factory::{Connected, FactoryIdentity, Provenance, SocketFactory};
use crate::connect::handle::{HandleState, TransportHandle};
use crate::error::{self, Error, NoAddresses, Result};
use crate::telemetry::ConnectStats;

/// Validated arguments of one connect call.
///
/// The deadline starts when the request is built.
#[derive(Debug)]
pub(crate) struct ConnectRequest {
    pub(crate) endpoint: Endpoint,
    pub(crate) local: Option<LocalBind>,
    pub(crate) options: SocketOptions,
    pub(crate) deadline: Deadline,
}

impl ConnectRequest {
    pub(crate) fn new(
        host: &str,
        port: u16,
        local: Option<LocalBind>,
        params: &dyn Params,
    ) -> Result<Self> {
        let endpoint = Endpoint::new(host, port);
        endpoint.validate()?;

        let with_endpoint = |e: Error| e.with_endpoint(endpoint.clone());
        if let Some(bind) = &local {
            bind.effective_port().map_err(with_endpoint)?;
        }
        let timeout = config::connect_timeout(params)
            .map_err(Error::from)
            .map_err(with_endpoint)?;
        let options = SocketOptions::from_params(params)
            .map_err(Error::from)
            .map_err(with_endpoint)?;

        Ok(Self {
            deadline: Deadline::after(timeout),
            endpoint,
            local,
            options,
        })
    }
}

/// Factory for plain TCP transports.
///
/// All instances are equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSocketFactory;

impl PlainSocketFactory {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SocketFactory for PlainSocketFactory {
    fn identity(&self) -> FactoryIdentity {
        FactoryIdentity::Plain
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
        let result = ConnectRequest::new(host, port, local, params)
            .and_then(|request| connect_plain(handle, &request));
        ConnectStats::global().record_connect(&result);
        result
    }
}

impl PartialEq for PlainSocketFactory {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for PlainSocketFactory {}

impl Hash for PlainSocketFactory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Connect `handle` (or a fresh one) as a plain transport.
pub(crate) fn connect_plain(
    handle: Option<TransportHandle>,
    request: &ConnectRequest,
) -> Result<Connected> {
    let (mut handle, provenance) = match handle {
        None => (
            TransportHandle::unconnected(Domain::IPV4)
                .map_err(|e| e.with_endpoint(request.endpoint.clone()))?,
            Provenance::Created,
        ),
        Some(handle) => match handle.state() {
            HandleState::Unconnected => (handle, Provenance::Reused),
            HandleState::Closed => {
                return Err(error::handle_closed().with_endpoint(request.endpoint.clone()));
            }
            HandleState::Connected => {
                return Err(error::invalid_argument(format!(
                    "{} is already connected",
                    handle.id()
                ))
                .with_endpoint(request.endpoint.clone()));
            }
        },
    };

    establish(&mut handle, request)?;
    tracing::debug!(
        handle = %handle.id(),
        host = %request.endpoint.host(),
        port = request.endpoint.port(),
        "Transport connected"
    );
    Ok(Connected { handle, provenance })
}

/// Resolve and connect an unconnected handle within the request deadline.
fn establish(handle: &mut TransportHandle, request: &ConnectRequest) -> Result<()> {
    let mut closed = handle.closed_signal();
    let deadline = request.deadline;

    let result = deadline::block_on(move || async move {
        let addrs = deadline
            .bound(&mut closed, dns::resolve(&request.endpoint))
            .await?;
        let addrs = reachable_from(addrs, request.local.as_ref())?;

        let mut last_error = None;
        for addr in addrs {
            deadline.check()?;
            let (socket, lease) = handle.socket_for(&addr)?;
            let local = request
                .local
                .map(|bind| bind.socket_addr_for(&addr))
                .transpose()?;

            tracing::debug!(handle = %handle.id(), addr = %addr, "Connecting");
            let attempt = connect_addr(socket, addr, &request.options, local);
            match deadline.bound(&mut closed, attempt).await {
                Ok(stream) => {
                    handle.attach(stream, lease);
                    return Ok(());
                }
                Err(e) if e.is_closed() || deadline.is_expired() => return Err(e),
                Err(e) => {
                    tracing::debug!(addr = %addr, "Connect attempt failed: {}", e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| error::unresolved_host(NoAddresses)))
    });

    result.map_err(|e| {
        tracing::debug!(
            host = %request.endpoint.host(),
            port = request.endpoint.port(),
            "Connect failed: {}",
            e
        );
        e.with_endpoint(request.endpoint.clone())
    })
}

/// Keep only the addresses a fixed local address can reach.
fn reachable_from(addrs: Vec<SocketAddr>, local: Option<&LocalBind>) -> Result<Vec<SocketAddr>> {
    let Some(ip) = local.and_then(|bind| bind.address) else {
        return Ok(addrs);
    };
    let reachable: Vec<SocketAddr> = addrs
        .into_iter()
        .filter(|addr| addr.is_ipv4() == ip.is_ipv4())
        .collect();
    if reachable.is_empty() {
        return Err(error::invalid_argument(format!(
            "local address {ip} cannot reach any resolved address"
        )));
    }
    Ok(reachable)
}

async fn connect_addr(
    socket: Socket,
    addr: SocketAddr,
    options: &SocketOptions,
    local: Option<SocketAddr>,
) -> Result<TcpStream> {
    socket_config::configure_socket(&socket, options, local).map_err(error::transport_io)?;
    socket.set_nonblocking(true).map_err(error::transport_io)?;

    let socket = tokio::net::TcpSocket::from_std_stream(socket.into());
    let stream = socket.connect(addr).await.map_err(connect_error)?;

    let stream = stream.into_std().map_err(error::transport_io)?;
    stream.set_nonblocking(false).map_err(error::transport_io)?;
    socket_config::configure_stream(&stream, options).map_err(error::transport_io)?;
    Ok(stream)
}

fn connect_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::TimedOut {
        error::connect_timeout(e)
    } else {
        error::transport_io(e)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv6Addr, TcpListener};

    use super::*;
    use crate::config::{ParamSet, keys};

    #[test]
    fn request_rejects_bad_arguments() {
        let params = ParamSet::new();
        assert!(ConnectRequest::new("", 80, None, &params)
            .expect_err("empty host")
            .is_invalid_argument());
        assert!(ConnectRequest::new("localhost", 0, None, &params)
            .expect_err("zero port")
            .is_invalid_argument());
        assert!(ConnectRequest::new("localhost", 80, Some(LocalBind::new(None, 70_000)), &params)
            .expect_err("local port")
            .is_invalid_argument());

        let negative = ParamSet::new().with(keys::CONNECT_TIMEOUT_MILLIS, -5_i64);
        let err = ConnectRequest::new("localhost", 80, None, &negative).expect_err("negative");
        assert!(err.is_invalid_argument());
        assert_eq!(err.endpoint(), Some(&Endpoint::new("localhost", 80)));
    }

    #[test]
    fn plain_connect_reuses_given_handle() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener");
        let port = listener.local_addr().expect("addr").port();
        let factory = PlainSocketFactory::new();

        let handle = factory.create_socket().expect("socket");
        let id = handle.id();
        let connected = factory
            .connect_socket(Some(handle), "127.0.0.1", port, None, &ParamSet::new())
            .expect("connect");

        assert_eq!(connected.provenance, Provenance::Reused);
        assert_eq!(connected.handle.id(), id);
        assert_eq!(connected.handle.state(), HandleState::Connected);
        assert_eq!(connected.handle.peer_addr().expect("peer").port(), port);
    }

    #[test]
    fn connected_handle_is_rejected_and_released() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener");
        let port = listener.local_addr().expect("addr").port();
        let factory = PlainSocketFactory::new();

        let connected = factory
            .connect_socket(None, "127.0.0.1", port, None, &ParamSet::new())
            .expect("connect");
        assert_eq!(connected.provenance, Provenance::Created);
        let probe = connected.handle.release_probe();

        let err = factory
            .connect_socket(Some(connected.handle), "127.0.0.1", port, None, &ParamSet::new())
            .expect_err("already connected");
        assert!(err.is_invalid_argument());
        assert!(probe.is_released());
    }

    #[test]
    fn refused_connect_is_transport_io() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("listener");
            listener.local_addr().expect("addr").port()
        };
        let factory = PlainSocketFactory::new();
        let handle = factory.create_socket().expect("socket");
        let probe = handle.release_probe();

        let err = factory
            .connect_socket(Some(handle), "127.0.0.1", port, None, &ParamSet::new())
            .expect_err("nothing listens");
        assert!(err.is_transport_io());
        assert!(probe.is_released());
    }

    #[test]
    fn local_family_filters_addresses() {
        let addrs: Vec<SocketAddr> = vec!["[::1]:80".parse().expect("valid")];
        let v4 = LocalBind::address(IpAddr::from([127, 0, 0, 1]));
        assert!(reachable_from(addrs.clone(), Some(&v4))
            .expect_err("no v4 target")
            .is_invalid_argument());

        let v6 = LocalBind::address(IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(reachable_from(addrs.clone(), Some(&v6)).expect("v6 target"), addrs);
        assert_eq!(reachable_from(addrs.clone(), None).expect("any"), addrs);
    }

    #[test]
    fn factories_are_equal() {
        assert_eq!(PlainSocketFactory::new(), PlainSocketFactory);
        assert_eq!(PlainSocketFactory.identity(), FactoryIdentity::Plain);
    }
}
