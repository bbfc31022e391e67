//! Outbound connection establishment
//!
//! The [`SocketFactory`] contract, transport handles and the plain TCP
//! factory. The TLS factory lives in [`crate::tls`].

pub(crate) mod deadline;
pub mod endpoint;
pub mod factory;
pub mod handle;
pub mod lease;
pub mod tcp;

pub use endpoint::{Endpoint, LocalBind};
pub use factory::{Connected, FactoryIdentity, LayeredSocketFactory, Provenance, SocketFactory};
pub use handle::{HandleId, HandleState, TransportHandle};
pub use lease::{HandleCloser, ReleaseProbe};
pub use tcp::PlainSocketFactory;
