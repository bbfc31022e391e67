use std::fmt;

/// A marker type to indicate that a connect deadline elapsed.
#[derive(Debug)]
pub struct TimedOut;

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("deadline elapsed")
    }
}

impl std::error::Error for TimedOut {}

/// A marker type to indicate that a handle was closed while connecting.
#[derive(Debug)]
pub struct HandleClosed;

impl fmt::Display for HandleClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("transport handle closed")
    }
}

impl std::error::Error for HandleClosed {}

/// A marker type to indicate that resolution produced no address.
#[derive(Debug)]
pub struct NoAddresses;

impl fmt::Display for NoAddresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no addresses resolved")
    }
}

impl std::error::Error for NoAddresses {}
