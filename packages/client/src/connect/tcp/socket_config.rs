//! TCP socket configuration
//!
//! Options that must be in place before the handshake (buffers, linger,
//! address reuse, keepalive, local bind) go on the raw socket; nodelay and
//! the read timeout go on the connected stream.

use std::io;
use std::net::{SocketAddr, TcpStream};

use socket2::Socket;

use crate::config::SocketOptions;

/// Apply pre-connect options and bind `local`, if any.
pub(crate) fn configure_socket(
    socket: &Socket,
    options: &SocketOptions,
    local: Option<SocketAddr>,
) -> io::Result<()> {
    if let Some(size) = options.buffer_size {
        socket.set_send_buffer_size(size)?;
        socket.set_recv_buffer_size(size)?;
    }
    if options.linger.is_some() {
        socket.set_linger(options.linger)?;
    }
    if options.reuse_address {
        socket.set_reuse_address(true)?;
    }
    if options.keepalive {
        socket.set_keepalive(true)?;
    }
    if let Some(addr) = local {
        socket.bind(&addr.into())?;
        tracing::debug!(local = %addr, "Bound local address");
    }
    Ok(())
}

/// Apply post-connect options to an established stream.
#[inline]
pub(crate) fn configure_stream(stream: &TcpStream, options: &SocketOptions) -> io::Result<()> {
    stream.set_nodelay(options.nodelay)?;
    stream.set_read_timeout(options.so_timeout)?;
    Ok(())
}
