use super::types::{Error, Kind};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a socket that could not be allocated.
pub fn transport_creation<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::TransportCreation).with(e.into())
}

/// Creates an `Error` for a host with no usable address.
pub fn unresolved_host<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::UnresolvedHost).with(e.into())
}

/// Creates an `Error` for an expired connect deadline.
pub fn connect_timeout<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::ConnectTimeout).with(e.into())
}

/// Creates an `Error` for an I/O fault during connect.
pub fn transport_io<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::TransportIo).with(e.into())
}

/// Creates an `Error` for a failed secure handshake.
pub fn secure_handshake<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::SecureHandshake).with(e.into())
}

/// Creates an `Error` for a broken connect precondition.
pub fn invalid_argument<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::InvalidArgument).with(e.into())
}

/// Creates an `Error` for a handle closed through its `HandleCloser`.
pub fn handle_closed() -> Error {
    Error::new(Kind::TransportIo).with(super::helpers::HandleClosed)
}

/// Creates an `Error` for a deadline that elapsed.
pub fn deadline_elapsed() -> Error {
    Error::new(Kind::ConnectTimeout).with(super::helpers::TimedOut)
}
