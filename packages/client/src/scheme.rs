//! Protocol schemes and their socket factories
//!
//! A [`Scheme`] binds a URI scheme name to a default port and the factory
//! that creates its transports. [`SchemeRegistry`] is the lookup table a
//! connection manager consults before connecting.

use std::fmt;

use hashbrown::HashMap;

use crate::config::Params;
use crate::connect::{
    Connected, FactoryIdentity, LayeredSocketFactory, LocalBind, PlainSocketFactory,
    SocketFactory, TransportHandle,
};
use crate::error::{self, Result};
use crate::tls::{TlsError, TlsSettings, TlsSocketFactory};

/// One of the built-in socket factories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnySocketFactory {
    Plain(PlainSocketFactory),
    Tls(TlsSocketFactory),
}

impl AnySocketFactory {
    /// The layering view of this factory, if it layers.
    #[must_use]
    pub fn as_layered(&self) -> Option<&dyn LayeredSocketFactory> {
        match self {
            Self::Plain(_) => None,
            Self::Tls(factory) => Some(factory),
        }
    }

    fn as_dyn(&self) -> &dyn SocketFactory {
        match self {
            Self::Plain(factory) => factory,
            Self::Tls(factory) => factory,
        }
    }
}

impl From<PlainSocketFactory> for AnySocketFactory {
    fn from(factory: PlainSocketFactory) -> Self {
        Self::Plain(factory)
    }
}

impl From<TlsSocketFactory> for AnySocketFactory {
    fn from(factory: TlsSocketFactory) -> Self {
        Self::Tls(factory)
    }
}

impl SocketFactory for AnySocketFactory {
    fn identity(&self) -> FactoryIdentity {
        self.as_dyn().identity()
    }

    fn create_socket(&self) -> Result<TransportHandle> {
        self.as_dyn().create_socket()
    }

    fn connect_socket(
        &self,
        handle: Option<TransportHandle>,
        host: &str,
        port: u16,
        local: Option<LocalBind>,
        params: &dyn Params,
    ) -> Result<Connected> {
        self.as_dyn()
            .connect_socket(handle, host, port, local, params)
    }
}

/// A named protocol scheme, such as `http` or `https`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scheme {
    name: String,
    default_port: u16,
    factory: AnySocketFactory,
}

impl Scheme {
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name or a zero default port.
    pub fn new(
        name: impl AsRef<str>,
        default_port: u16,
        factory: impl Into<AnySocketFactory>,
    ) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(error::invalid_argument("scheme name cannot be empty"));
        }
        if default_port == 0 {
            return Err(error::invalid_argument(format!(
                "default port of scheme {name} must be in 1..=65535"
            )));
        }
        Ok(Self {
            name: name.to_ascii_lowercase(),
            default_port,
            factory: factory.into(),
        })
    }

    /// Lowercase scheme name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    #[must_use]
    pub fn factory(&self) -> &AnySocketFactory {
        &self.factory
    }

    #[must_use]
    pub fn is_layered(&self) -> bool {
        self.factory.identity().is_layered()
    }

    /// The port to connect to: `port` unless unset or zero, the scheme
    /// default otherwise.
    #[must_use]
    pub fn resolve_port(&self, port: Option<u16>) -> u16 {
        match port {
            Some(port) if port > 0 => port,
            _ => self.default_port,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.default_port)
    }
}

/// Schemes by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    schemes: HashMap<String, Scheme>,
}

impl SchemeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `http` (plain, port 80) and `https` (TLS with the
    /// webpki roots, port 443).
    ///
    /// # Errors
    ///
    /// Returns a `TlsError` if the default TLS configuration cannot be built.
    pub fn with_defaults() -> std::result::Result<Self, TlsError> {
        let tls = TlsSocketFactory::new(TlsSettings::default())?;
        let mut registry = Self::new();
        registry.register(Scheme {
            name: "http".to_string(),
            default_port: 80,
            factory: PlainSocketFactory.into(),
        });
        registry.register(Scheme {
            name: "https".to_string(),
            default_port: 443,
            factory: tls.into(),
        });
        Ok(registry)
    }

    /// Register `scheme`, returning the scheme it replaces.
    pub fn register(&mut self, scheme: Scheme) -> Option<Scheme> {
        tracing::debug!(scheme = %scheme, "Registering scheme");
        self.schemes.insert(scheme.name.clone(), scheme)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Scheme> {
        self.schemes.remove(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scheme> {
        self.schemes.get(&name.to_ascii_lowercase())
    }

    /// Like [`get`](Self::get), failing for unknown names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when no scheme is registered under `name`.
    pub fn get_scheme(&self, name: &str) -> Result<&Scheme> {
        self.get(name)
            .ok_or_else(|| error::invalid_argument(format!("scheme '{name}' not registered")))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn scheme_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}
