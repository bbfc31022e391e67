//! TLS layering over plain transports
//!
//! [`TlsSocketFactory`] connects through the plain TCP path and then runs a
//! rustls client handshake on the connected stream, bounded by the same
//! connect deadline.

pub mod errors;
pub mod factory;
pub(crate) mod handshake;
pub mod settings;
pub(crate) mod verifier;

pub use errors::TlsError;
pub use factory::TlsSocketFactory;
pub use settings::{TlsSettings, TrustAnchors};
