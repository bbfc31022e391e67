//! Telemetry for connection establishment
//!
//! Counters are process-wide and lock-free; they never influence connect
//! behavior.

pub mod connect_stats;

pub use connect_stats::{ConnectStats, ConnectStatsSnapshot};
