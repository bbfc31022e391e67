use std::error::Error as StdError;
use std::fmt;

use crate::connect::Endpoint;

/// A Result alias where the Err case is `tether_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while creating or connecting a transport.
pub struct Error {
    pub inner: Box<Inner>,
}

pub struct Inner {
    pub kind: Kind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The platform could not allocate a socket
    TransportCreation,
    /// The target host resolved to no usable address
    UnresolvedHost,
    /// Resolution, connect or handshake did not finish before the deadline
    ConnectTimeout,
    /// Lower-level I/O fault while connecting
    TransportIo,
    /// The secure layer could not be established
    SecureHandshake,
    /// The caller broke the connect contract (bad port, empty host, wrong handle state)
    InvalidArgument,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                endpoint: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.inner.endpoint = Some(endpoint);
        self
    }

    /// The kind of failure.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// The endpoint the failed call was targeting, if known.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.inner.endpoint.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("tether_client::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref endpoint) = self.inner.endpoint {
            f.field("endpoint", endpoint);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::TransportCreation => f.write_str("failed to create transport")?,
            Kind::UnresolvedHost => f.write_str("unable to resolve host")?,
            Kind::ConnectTimeout => f.write_str("connect timed out")?,
            Kind::TransportIo => f.write_str("transport I/O error")?,
            Kind::SecureHandshake => f.write_str("secure handshake failed")?,
            Kind::InvalidArgument => f.write_str("invalid connect argument")?,
        }

        if let Some(ref endpoint) = self.inner.endpoint {
            write!(f, " ({endpoint})")?;
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
