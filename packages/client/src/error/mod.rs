pub mod classification;
pub mod constructors;
pub mod helpers;
pub mod types;

// Re-export main types and functions
pub use constructors::*;
pub use helpers::{HandleClosed, NoAddresses, TimedOut};
pub use types::{Error, Inner, Kind, Result};

impl From<crate::config::ConfigurationError> for Error {
    fn from(err: crate::config::ConfigurationError) -> Self {
        invalid_argument(err)
    }
}

impl From<crate::tls::TlsError> for Error {
    fn from(err: crate::tls::TlsError) -> Self {
        secure_handshake(err)
    }
}
