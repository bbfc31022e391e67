//! Host resolution for connect calls
//!
//! IP literals never reach the resolver. Host names go through the platform
//! resolver (`getaddrinfo` on a blocking thread) and the result is ordered
//! IPv4 first, keeping the resolver's order within each family.

use std::net::{IpAddr, SocketAddr};

use crate::connect::Endpoint;
use crate::error::{self, NoAddresses, Result};

/// Resolve `endpoint` to the ordered list of addresses to try.
pub(crate) async fn resolve(endpoint: &Endpoint) -> Result<Vec<SocketAddr>> {
    // Fast path for IP addresses
    if let Some(ip) = endpoint.ip_literal() {
        return Ok(vec![SocketAddr::new(ip, endpoint.port())]);
    }

    let host = endpoint.bare_host();
    let resolved = tokio::net::lookup_host((host, endpoint.port()))
        .await
        .map_err(|e| {
            tracing::debug!(host = %host, "DNS resolution failed: {}", e);
            error::unresolved_host(e)
        })?;

    let mut addrs: Vec<SocketAddr> = resolved.collect();
    if addrs.is_empty() {
        return Err(error::unresolved_host(NoAddresses));
    }

    sort_addresses_by_preference(&mut addrs);
    tracing::debug!(host = %host, count = addrs.len(), "Resolved host");
    Ok(addrs)
}

/// Stable sort putting IPv4 addresses before IPv6 ones.
pub(crate) fn sort_addresses_by_preference(addrs: &mut [SocketAddr]) {
    addrs.sort_by_key(|addr| match addr.ip() {
        IpAddr::V4(_) => 0,
        IpAddr::V6(_) => 1,
    });
}
