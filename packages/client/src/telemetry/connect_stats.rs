//! Process-wide connect statistics with cache-padded atomic counters
//!
//! Every OS socket owned by a transport handle is counted when it is
//! allocated and again when it is released, so `live_sockets()` is the
//! number of sockets the factories currently hold open on behalf of callers.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Thread-safe connect statistics.
///
/// Each counter is cache-padded to prevent false sharing between threads
/// connecting concurrently.
#[derive(Debug, Default)]
pub struct ConnectStats {
    /// OS sockets allocated by handles
    pub sockets_opened: CachePadded<AtomicU64>,
    /// OS sockets released by handles
    pub sockets_released: CachePadded<AtomicU64>,
    /// Connect calls that returned a connected handle
    pub connects_succeeded: CachePadded<AtomicU64>,
    /// Connect calls that failed for any reason
    pub connects_failed: CachePadded<AtomicU64>,
    /// Connect calls that failed because the deadline elapsed
    pub connect_timeouts: CachePadded<AtomicU64>,
    /// Completed secure handshakes
    pub handshakes_completed: CachePadded<AtomicU64>,
    /// Failed secure handshakes
    pub handshakes_failed: CachePadded<AtomicU64>,
}

/// Immutable snapshot of connect statistics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectStatsSnapshot {
    pub sockets_opened: u64,
    pub sockets_released: u64,
    pub connects_succeeded: u64,
    pub connects_failed: u64,
    pub connect_timeouts: u64,
    pub handshakes_completed: u64,
    pub handshakes_failed: u64,
}

impl ConnectStatsSnapshot {
    /// Sockets opened but not yet released at snapshot time.
    #[must_use]
    pub fn live_sockets(&self) -> u64 {
        self.sockets_opened.saturating_sub(self.sockets_released)
    }
}

static GLOBAL_STATS: OnceLock<ConnectStats> = OnceLock::new();

impl ConnectStats {
    /// The process-wide instance updated by all factories.
    pub fn global() -> &'static ConnectStats {
        GLOBAL_STATS.get_or_init(ConnectStats::default)
    }

    #[inline]
    pub fn snapshot(&self) -> ConnectStatsSnapshot {
        ConnectStatsSnapshot {
            sockets_opened: self.sockets_opened.load(Ordering::Relaxed),
            sockets_released: self.sockets_released.load(Ordering::Relaxed),
            connects_succeeded: self.connects_succeeded.load(Ordering::Relaxed),
            connects_failed: self.connects_failed.load(Ordering::Relaxed),
            connect_timeouts: self.connect_timeouts.load(Ordering::Relaxed),
            handshakes_completed: self.handshakes_completed.load(Ordering::Relaxed),
            handshakes_failed: self.handshakes_failed.load(Ordering::Relaxed),
        }
    }

    /// Sockets currently held open by handles.
    #[inline]
    pub fn live_sockets(&self) -> u64 {
        // Released is read first so a concurrent open cannot make this underflow.
        let released = self.sockets_released.load(Ordering::Acquire);
        let opened = self.sockets_opened.load(Ordering::Acquire);
        opened.saturating_sub(released)
    }

    #[inline]
    pub(crate) fn record_socket_opened(&self) {
        self.sockets_opened.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn record_socket_released(&self) {
        self.sockets_released.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn record_connect(&self, result: &crate::error::Result<impl Sized>) {
        match result {
            Ok(_) => {
                self.connects_succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.connects_failed.fetch_add(1, Ordering::Relaxed);
                if err.is_timeout() {
                    self.connect_timeouts.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    #[inline]
    pub(crate) fn record_handshake(&self, completed: bool) {
        if completed {
            self.handshakes_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.handshakes_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
