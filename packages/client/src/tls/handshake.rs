//! Blocking TLS handshake over a connected TCP stream
//!
//! The handshake is driven with `complete_io` on the blocking stream. Read
//! and write timeouts are reset from the remaining deadline before every
//! round trip, then restored once the session is established.

use std::io;
use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};

use crate::connect::deadline::Deadline;
use crate::connect::handle::SecureStream;
use crate::connect::lease::LineageShared;
use crate::error::{self, Error, Result};

/// Run the client handshake on `stream`.
///
/// On failure `stream` is dropped, and thereby closed, before the error is
/// returned.
pub(crate) fn handshake(
    config: Arc<ClientConfig>,
    server_name: ServerName<'static>,
    stream: TcpStream,
    deadline: Deadline,
    lineage: &LineageShared,
) -> Result<SecureStream> {
    let conn = ClientConnection::new(config, server_name).map_err(error::secure_handshake)?;
    let mut tls = SecureStream::new(conn, stream);

    let read_timeout = tls.sock.read_timeout().map_err(error::transport_io)?;
    let write_timeout = tls.sock.write_timeout().map_err(error::transport_io)?;

    while tls.conn.is_handshaking() {
        if lineage.is_closed() {
            return Err(error::handle_closed());
        }
        let remaining = match deadline.remaining() {
            Some(left) if left.is_zero() => return Err(error::deadline_elapsed()),
            left => left,
        };
        tls.sock
            .set_read_timeout(remaining)
            .and_then(|()| tls.sock.set_write_timeout(remaining))
            .map_err(error::transport_io)?;

        match tls.conn.complete_io(&mut tls.sock) {
            Ok((0, 0)) if tls.conn.is_handshaking() => {
                return Err(classify(io::Error::from(io::ErrorKind::UnexpectedEof), lineage));
            }
            Ok(_) => {}
            Err(e) => return Err(classify(e, lineage)),
        }
    }

    tls.sock
        .set_read_timeout(read_timeout)
        .and_then(|()| tls.sock.set_write_timeout(write_timeout))
        .map_err(error::transport_io)?;

    tracing::debug!(
        version = ?tls.conn.protocol_version(),
        alpn = ?tls.conn.alpn_protocol().map(String::from_utf8_lossy),
        "TLS handshake completed"
    );
    Ok(tls)
}

/// Map a handshake I/O failure onto the error model.
fn classify(e: io::Error, lineage: &LineageShared) -> Error {
    if lineage.is_closed() {
        return error::handle_closed();
    }
    match e.kind() {
        // Socket timeouts are derived from the deadline.
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => error::connect_timeout(e),
        _ => error::secure_handshake(e),
    }
}
