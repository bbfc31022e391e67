//! Accounting for OS sockets owned by a handle lineage
//!
//! A lineage is a base handle plus every handle that wraps it. All of them
//! share one control block, so a probe taken on the base handle still sees
//! the sockets held by the secure handle layered on top of it.

use std::fmt;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use socket2::{Domain, Socket};
use tokio::sync::watch;

use crate::telemetry::ConnectStats;

/// Control block shared by a handle lineage, its closers and probes.
#[derive(Debug)]
pub(crate) struct LineageShared {
    closed_tx: watch::Sender<bool>,
    live: AtomicUsize,
    interrupt: Mutex<Option<TcpStream>>,
    /// The socket of an unconnected handle. Its lease points back at this
    /// block, so `close` and handle drop both empty the slot.
    idle: Mutex<Option<IdleSocket>>,
}

/// An allocated socket waiting for its first connect attempt.
pub(crate) struct IdleSocket {
    pub(crate) socket: Socket,
    pub(crate) domain: Domain,
    pub(crate) lease: SocketLease,
}

impl fmt::Debug for IdleSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleSocket")
            .field("socket", &self.socket)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl LineageShared {
    pub(crate) fn new() -> Arc<Self> {
        let (closed_tx, _) = watch::channel(false);
        Arc::new(Self {
            closed_tx,
            live: AtomicUsize::new(0),
            interrupt: Mutex::new(None),
            idle: Mutex::new(None),
        })
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }

    pub(crate) fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed_tx.subscribe()
    }

    pub(crate) fn live_sockets(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Mark the lineage closed, release an idle socket and shut down the
    /// connected stream, if any.
    pub(crate) fn close(&self) {
        self.closed_tx.send_replace(true);
        drop(self.take_idle());
        if let Some(stream) = self.take_interrupt() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Register a duplicate of the connected stream so `close` can interrupt
    /// blocking I/O on it from another thread.
    pub(crate) fn arm_interrupt(&self, stream: &TcpStream) {
        match stream.try_clone() {
            Ok(dup) => {
                *self.interrupt.lock().unwrap_or_else(PoisonError::into_inner) = Some(dup);
            }
            Err(e) => tracing::debug!("Cannot arm close interrupt: {}", e),
        }
        // Closed while we were arming: honor it now.
        if self.is_closed() {
            if let Some(stream) = self.take_interrupt() {
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
    }

    pub(crate) fn disarm_interrupt(&self) {
        drop(self.take_interrupt());
    }

    pub(crate) fn park(&self, idle: IdleSocket) {
        *self.idle.lock().unwrap_or_else(PoisonError::into_inner) = Some(idle);
        if self.is_closed() {
            drop(self.take_idle());
        }
    }

    pub(crate) fn take_idle(&self) -> Option<IdleSocket> {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Local address of the idle socket, if one is parked.
    pub(crate) fn idle_local_addr(&self) -> Option<io::Result<SocketAddr>> {
        let idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        idle.as_ref().map(|idle| {
            idle.socket.local_addr()?.as_socket().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "not an inet socket")
            })
        })
    }

    fn take_interrupt(&self) -> Option<TcpStream> {
        self.interrupt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Proof of ownership of one OS socket. Dropping it records the release.
#[derive(Debug)]
pub(crate) struct SocketLease {
    shared: Arc<LineageShared>,
}

impl SocketLease {
    pub(crate) fn acquire(shared: &Arc<LineageShared>) -> Self {
        shared.live.fetch_add(1, Ordering::AcqRel);
        ConnectStats::global().record_socket_opened();
        Self {
            shared: Arc::clone(shared),
        }
    }
}

impl Drop for SocketLease {
    fn drop(&mut self) {
        self.shared.live.fetch_sub(1, Ordering::AcqRel);
        ConnectStats::global().record_socket_released();
    }
}

/// Reports whether every socket of a handle lineage has been released.
#[derive(Debug, Clone)]
pub struct ReleaseProbe {
    shared: Arc<LineageShared>,
}

impl ReleaseProbe {
    pub(crate) fn new(shared: &Arc<LineageShared>) -> Self {
        Self {
            shared: Arc::clone(shared),
        }
    }

    /// Sockets still held by the lineage.
    #[must_use]
    pub fn live_sockets(&self) -> usize {
        self.shared.live_sockets()
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.live_sockets() == 0
    }
}

/// Closes a handle from another thread.
///
/// A connect blocked on the handle fails promptly with a transport I/O
/// error, an unconnected handle releases its socket at once and a connected
/// handle has its stream shut down.
#[derive(Debug, Clone)]
pub struct HandleCloser {
    shared: Arc<LineageShared>,
}

impl HandleCloser {
    pub(crate) fn new(shared: &Arc<LineageShared>) -> Self {
        Self {
            shared: Arc::clone(shared),
        }
    }

    pub fn close(&self) {
        tracing::debug!("Closing transport handle from closer");
        self.shared.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}
