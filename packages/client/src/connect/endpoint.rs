//! Remote endpoint and local bind descriptors

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error::{self, Result};

/// Target of a connect call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The host without IPv6 literal brackets.
    #[must_use]
    pub fn bare_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host)
    }

    /// The host parsed as an IP literal, if it is one.
    #[must_use]
    pub fn ip_literal(&self) -> Option<IpAddr> {
        self.bare_host().parse().ok()
    }

    /// Check the connect preconditions: non-empty host and a non-zero port.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error describing the violation.
    pub fn validate(&self) -> Result<()> {
        if self.bare_host().trim().is_empty() {
            return Err(error::invalid_argument("host cannot be empty").with_endpoint(self.clone()));
        }
        if self.port == 0 {
            return Err(
                error::invalid_argument("port must be in 1..=65535").with_endpoint(self.clone())
            );
        }
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip_literal() {
            Some(IpAddr::V6(ip)) => write!(f, "[{ip}]:{}", self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

/// Local address and port to bind before connecting.
///
/// A missing address binds the wildcard address of whatever family the
/// target uses. A local port of zero or below means "any".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LocalBind {
    pub address: Option<IpAddr>,
    pub port: i32,
}

impl LocalBind {
    #[must_use]
    pub fn new(address: Option<IpAddr>, port: i32) -> Self {
        Self { address, port }
    }

    #[must_use]
    pub fn address(address: IpAddr) -> Self {
        Self {
            address: Some(address),
            port: 0,
        }
    }

    /// The local port, with every non-positive value folded to 0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for ports above 65535.
    pub fn effective_port(&self) -> Result<u16> {
        if self.port <= 0 {
            return Ok(0);
        }
        u16::try_from(self.port)
            .map_err(|_| error::invalid_argument(format!("local port {} out of range", self.port)))
    }

    /// The concrete address to bind when connecting to `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an out-of-range port or when the local
    /// address family differs from the target's.
    pub fn socket_addr_for(&self, target: &SocketAddr) -> Result<SocketAddr> {
        let port = self.effective_port()?;
        let ip = match (self.address, target) {
            (Some(ip), _) if ip.is_ipv4() == target.is_ipv4() => ip,
            (Some(ip), _) => {
                return Err(error::invalid_argument(format!(
                    "local address {ip} cannot reach {target}"
                )));
            }
            (None, SocketAddr::V4(_)) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            (None, SocketAddr::V6(_)) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Ok(SocketAddr::new(ip, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_host_and_zero_port_are_rejected() {
        assert!(Endpoint::new("", 80).validate().is_err());
        assert!(Endpoint::new("  ", 80).validate().is_err());
        assert!(Endpoint::new("[]", 80).validate().is_err());
        assert!(Endpoint::new("localhost", 0).validate().is_err());
        assert!(Endpoint::new("localhost", 65535).validate().is_ok());
    }

    #[test]
    fn ipv6_literals_render_with_brackets() {
        assert_eq!(Endpoint::new("::1", 443).to_string(), "[::1]:443");
        assert_eq!(Endpoint::new("[::1]", 443).to_string(), "[::1]:443");
        assert_eq!(Endpoint::new("example.com", 80).to_string(), "example.com:80");
        assert_eq!(
            Endpoint::new("[::1]", 443).ip_literal(),
            Some(IpAddr::V6(Ipv6Addr::LOCALHOST))
        );
    }

    #[test]
    fn negative_and_zero_local_ports_are_equivalent() {
        let target: SocketAddr = "127.0.0.1:80".parse().expect("valid address");
        let zero = LocalBind::new(None, 0).socket_addr_for(&target).expect("zero is any");
        let negative = LocalBind::new(None, -7).socket_addr_for(&target).expect("negative is any");
        assert_eq!(zero, negative);
        assert_eq!(zero.port(), 0);
        assert!(LocalBind::new(None, 70_000).effective_port().is_err());
    }

    #[test]
    fn wildcard_follows_target_family() {
        let v6: SocketAddr = "[::1]:80".parse().expect("valid address");
        let bound = LocalBind::default().socket_addr_for(&v6).expect("wildcard");
        assert_eq!(bound.ip(), IpAddr::V6(Ipv6Addr::UNSPECIFIED));

        let mismatch = LocalBind::address(IpAddr::V4(Ipv4Addr::LOCALHOST)).socket_addr_for(&v6);
        assert!(mismatch.is_err());
    }
}
