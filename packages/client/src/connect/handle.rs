//! Transport handles: unconnected, connected (plain or secure) and closed
//!
//! A handle owns at most one OS socket at a time. An unconnected handle parks
//! its socket in the lineage so a closer can release it; the connect path
//! takes it out for each attempt and attaches the resulting stream on
//! success. A failed attempt simply drops it.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustls::{ClientConnection, StreamOwned};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::sync::watch;

use super::lease::{HandleCloser, IdleSocket, LineageShared, ReleaseProbe, SocketLease};
use crate::error::{self, Result};

/// Global counter for handle ids. Relaxed ordering is enough for uniqueness.
static HANDLE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a transport handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        Self(HANDLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle-{}", self.0)
    }
}

/// Lifecycle state of a transport handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Created, no peer yet
    Unconnected,
    /// Bound to a live peer and usable for I/O
    Connected,
    /// Terminal
    Closed,
}

pub(crate) type SecureStream = StreamOwned<ClientConnection, TcpStream>;

enum Transport {
    /// The socket, if still allocated, is parked in the lineage.
    Unconnected,
    Plain {
        stream: TcpStream,
        lease: SocketLease,
    },
    Secure {
        stream: Box<SecureStream>,
        lease: SocketLease,
    },
    Closed,
}

/// An opaque network endpoint.
///
/// Implements [`Read`] and [`Write`] once connected; both fail with
/// `NotConnected` otherwise. Dropping the handle releases its socket.
pub struct TransportHandle {
    id: HandleId,
    shared: Arc<LineageShared>,
    transport: Transport,
}

impl TransportHandle {
    /// Allocate an unconnected TCP socket of the given family.
    pub(crate) fn unconnected(domain: Domain) -> Result<Self> {
        let shared = LineageShared::new();
        let (socket, lease) = allocate(domain, &shared)?;
        shared.park(IdleSocket {
            socket,
            domain,
            lease,
        });
        let handle = Self {
            id: HandleId::next(),
            shared,
            transport: Transport::Unconnected,
        };
        tracing::debug!(handle = %handle.id, "Created unconnected transport handle");
        Ok(handle)
    }

    /// Build the handle that wraps a base stream with a secure channel.
    /// It joins the base handle's lineage under a fresh id.
    pub(crate) fn secure(
        shared: Arc<LineageShared>,
        stream: SecureStream,
        lease: SocketLease,
    ) -> Self {
        shared.arm_interrupt(&stream.sock);
        Self {
            id: HandleId::next(),
            shared,
            transport: Transport::Secure {
                stream: Box::new(stream),
                lease,
            },
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> HandleState {
        match self.transport {
            Transport::Closed => HandleState::Closed,
            _ if self.shared.is_closed() => HandleState::Closed,
            Transport::Unconnected => HandleState::Unconnected,
            Transport::Plain { .. } | Transport::Secure { .. } => HandleState::Connected,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == HandleState::Connected
    }

    /// True when the handle carries a secure channel.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        matches!(self.transport, Transport::Secure { .. })
    }

    /// Protocol agreed through ALPN, for secure handles.
    #[must_use]
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        match &self.transport {
            Transport::Secure { stream, .. } => stream.conn.alpn_protocol(),
            _ => None,
        }
    }

    /// A closer that can close this handle (and its lineage) from another thread.
    #[must_use]
    pub fn closer(&self) -> HandleCloser {
        HandleCloser::new(&self.shared)
    }

    /// A probe that reports whether this handle's sockets were released,
    /// including sockets held by handles that later wrap it.
    #[must_use]
    pub fn release_probe(&self) -> ReleaseProbe {
        ReleaseProbe::new(&self.shared)
    }

    /// # Errors
    ///
    /// Fails when unconnected-and-unbound or closed.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match &self.transport {
            Transport::Unconnected => self
                .shared
                .idle_local_addr()
                .unwrap_or_else(|| Err(not_connected())),
            Transport::Plain { stream, .. } => stream.local_addr(),
            Transport::Secure { stream, .. } => stream.sock.local_addr(),
            Transport::Closed => Err(not_connected()),
        }
    }

    /// # Errors
    ///
    /// Fails unless connected.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp_stream().ok_or_else(not_connected)?.peer_addr()
    }

    /// Set the read timeout of the connected stream.
    ///
    /// # Errors
    ///
    /// Fails unless connected, or for a zero duration.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> io::Result<()> {
        self.tcp_stream().ok_or_else(not_connected)?.set_read_timeout(timeout)
    }

    /// Close the handle. Secure handles send `close_notify` first.
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the error of the final flush of a secure stream; the socket
    /// is released either way.
    pub fn close(&mut self) -> io::Result<()> {
        let transport = std::mem::replace(&mut self.transport, Transport::Closed);
        self.shared.disarm_interrupt();
        let result = match transport {
            Transport::Secure { mut stream, lease } => {
                stream.conn.send_close_notify();
                let flushed = stream.flush();
                let _ = stream.sock.shutdown(Shutdown::Both);
                drop(stream);
                drop(lease);
                flushed
            }
            Transport::Plain { stream, lease } => {
                let _ = stream.shutdown(Shutdown::Both);
                drop(stream);
                drop(lease);
                Ok(())
            }
            Transport::Unconnected | Transport::Closed => Ok(()),
        };
        self.shared.close();
        tracing::debug!(handle = %self.id, "Closed transport handle");
        result
    }

    pub(crate) fn lineage(&self) -> &Arc<LineageShared> {
        &self.shared
    }

    pub(crate) fn closed_signal(&self) -> watch::Receiver<bool> {
        self.shared.closed_signal()
    }

    /// Hand out a socket suitable for connecting to `target`.
    ///
    /// The parked socket is used when its family matches and it has not
    /// been consumed by an earlier attempt; otherwise a fresh socket of the
    /// right family is allocated. The handle stays unconnected.
    pub(crate) fn socket_for(&mut self, target: &SocketAddr) -> Result<(Socket, SocketLease)> {
        if !matches!(self.transport, Transport::Unconnected) {
            return Err(error::invalid_argument("transport handle is not unconnected"));
        }
        if self.shared.is_closed() {
            return Err(error::handle_closed());
        }
        let wanted = Domain::for_address(*target);
        match self.shared.take_idle() {
            Some(idle) if idle.domain == wanted => Ok((idle.socket, idle.lease)),
            // A mismatched socket is released before its replacement exists.
            _ => allocate(wanted, &self.shared),
        }
    }

    /// Attach the stream of a successful attempt.
    pub(crate) fn attach(&mut self, stream: TcpStream, lease: SocketLease) {
        self.shared.arm_interrupt(&stream);
        self.transport = Transport::Plain { stream, lease };
    }

    /// Detach the connected plain stream for layering. The handle is left
    /// closed but its lineage stays open for the wrapping handle.
    pub(crate) fn detach_plain(&mut self) -> Result<(TcpStream, SocketLease)> {
        match std::mem::replace(&mut self.transport, Transport::Closed) {
            Transport::Plain { stream, lease } if !self.shared.is_closed() => {
                self.shared.disarm_interrupt();
                Ok((stream, lease))
            }
            Transport::Plain { .. } => Err(error::handle_closed()),
            Transport::Secure { stream, lease } => {
                self.transport = Transport::Secure { stream, lease };
                Err(error::invalid_argument("transport handle is already layered"))
            }
            other => {
                self.transport = other;
                Err(error::invalid_argument("transport handle is not connected"))
            }
        }
    }

    fn tcp_stream(&self) -> Option<&TcpStream> {
        match &self.transport {
            Transport::Plain { stream, .. } => Some(stream),
            Transport::Secure { stream, .. } => Some(&stream.sock),
            _ => None,
        }
    }
}

fn allocate(domain: Domain, shared: &Arc<LineageShared>) -> Result<(Socket, SocketLease)> {
    let socket =
        Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(error::transport_creation)?;
    Ok((socket, SocketLease::acquire(shared)))
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport handle is not connected")
}

impl Read for TransportHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.transport {
            Transport::Plain { stream, .. } => stream.read(buf),
            Transport::Secure { stream, .. } => stream.read(buf),
            _ => Err(not_connected()),
        }
    }
}

impl Write for TransportHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.transport {
            Transport::Plain { stream, .. } => stream.write(buf),
            Transport::Secure { stream, .. } => stream.write(buf),
            _ => Err(not_connected()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.transport {
            Transport::Plain { stream, .. } => stream.flush(),
            Transport::Secure { stream, .. } => stream.flush(),
            _ => Err(not_connected()),
        }
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        match self.transport {
            Transport::Unconnected => drop(self.shared.take_idle()),
            // Only the handle currently holding the stream owns the interrupt.
            Transport::Plain { .. } | Transport::Secure { .. } => self.shared.disarm_interrupt(),
            Transport::Closed => {}
        }
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("secure", &self.is_secure())
            .finish()
    }
}
