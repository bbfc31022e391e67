//! The socket factory contract
//!
//! Connection managers create and connect transports exclusively through
//! [`SocketFactory`], and partition their pools by [`FactoryIdentity`].

use std::fmt;
use std::hash::{Hash, Hasher};

use super::endpoint::LocalBind;
use super::handle::{HandleId, TransportHandle};
use crate::config::Params;
use crate::error::Result;
use crate::tls::TlsSettings;

/// Behavioral identity of a factory.
///
/// Two factories are interchangeable for pooling purposes iff their
/// identities are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FactoryIdentity {
    /// Plain TCP, no layering
    Plain,
    /// TCP with a TLS layer configured by the given settings
    Layered(TlsSettings),
}

impl FactoryIdentity {
    #[must_use]
    pub fn is_layered(&self) -> bool {
        matches!(self, Self::Layered(_))
    }
}

/// How the handle returned by a connect relates to the one passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// The caller's handle, now connected
    Reused,
    /// A handle created by the factory because none was supplied
    Created,
    /// A new handle wrapping the stream of the consumed handle `base`
    Wrapped { base: HandleId },
}

/// A successfully connected transport.
#[derive(Debug)]
pub struct Connected {
    pub handle: TransportHandle,
    pub provenance: Provenance,
}

impl Connected {
    #[must_use]
    pub fn into_handle(self) -> TransportHandle {
        self.handle
    }
}

/// Creates and connects transport handles.
///
/// Implementations hold only immutable configuration. `connect_socket`
/// blocks the calling thread and must not be called from inside an async
/// runtime.
pub trait SocketFactory: Send + Sync + fmt::Debug {
    /// Identity used for equality, hashing and pool partitioning.
    fn identity(&self) -> FactoryIdentity;

    /// Allocate a new unconnected handle.
    ///
    /// # Errors
    ///
    /// `TransportCreation` when the platform cannot allocate a socket.
    fn create_socket(&self) -> Result<TransportHandle>;

    /// Connect `handle` (or a new handle when `None`) to `host:port`.
    ///
    /// The whole call, including resolution and any handshake, is bounded
    /// by the `connectTimeoutMillis` parameter. On failure every socket
    /// touched by the call is released.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a bad endpoint, bad parameters or a handle
    /// that is not unconnected; `UnresolvedHost`, `ConnectTimeout`,
    /// `TransportIo` or `SecureHandshake` for runtime failures.
    fn connect_socket(
        &self,
        handle: Option<TransportHandle>,
        host: &str,
        port: u16,
        local: Option<LocalBind>,
        params: &dyn Params,
    ) -> Result<Connected>;
}

/// A factory that can layer a protocol on top of an already connected
/// plain transport.
pub trait LayeredSocketFactory: SocketFactory {
    /// Layer over the connected plain `handle`, consuming it.
    ///
    /// `host` and `port` name the logical target, which may differ from
    /// the peer the handle is connected to (e.g. through a proxy tunnel).
    /// The returned handle always has a new id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `handle` is not a connected plain handle;
    /// `SecureHandshake` or `ConnectTimeout` when layering fails, in which
    /// case the base handle is closed.
    fn layer(
        &self,
        handle: TransportHandle,
        host: &str,
        port: u16,
        params: &dyn Params,
    ) -> Result<TransportHandle>;
}

impl PartialEq for dyn SocketFactory + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for dyn SocketFactory + '_ {}

impl Hash for dyn SocketFactory + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
