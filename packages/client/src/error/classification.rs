use std::error::Error as StdError;

use super::helpers::{HandleClosed, TimedOut};
use super::types::{Error, Kind};

impl Error {
    /// Returns true if the socket could not be allocated.
    #[must_use]
    pub fn is_transport_creation(&self) -> bool {
        matches!(self.inner.kind, Kind::TransportCreation)
    }

    /// Returns true if the host could not be resolved.
    #[must_use]
    pub fn is_unresolved_host(&self) -> bool {
        matches!(self.inner.kind, Kind::UnresolvedHost)
    }

    /// Returns true if the connect deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        if matches!(self.inner.kind, Kind::ConnectTimeout) {
            return true;
        }

        let mut source = self.source();
        while let Some(err) = source {
            if err.is::<TimedOut>() {
                return true;
            }
            source = err.source();
        }

        false
    }

    /// Returns true for lower-level I/O faults.
    #[must_use]
    pub fn is_transport_io(&self) -> bool {
        matches!(self.inner.kind, Kind::TransportIo)
    }

    /// Returns true if the secure layer could not be established.
    #[must_use]
    pub fn is_secure_handshake(&self) -> bool {
        matches!(self.inner.kind, Kind::SecureHandshake)
    }

    /// Returns true if the caller broke the connect contract.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.inner.kind, Kind::InvalidArgument)
    }

    /// Returns true if the failure came from closing the handle through a
    /// `HandleCloser` while the connect was in flight.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let mut source = self.source();
        while let Some(err) = source {
            if err.is::<HandleClosed>() {
                return true;
            }
            source = err.source();
        }
        false
    }

    /// Returns the underlying `std::io::Error`, if the cause was one.
    #[must_use]
    pub fn io_error(&self) -> Option<&std::io::Error> {
        let mut source = self.source();
        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<std::io::Error>() {
                return Some(io);
            }
            source = err.source();
        }
        None
    }
}
