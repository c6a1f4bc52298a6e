//! Logging macros that set target to "port_relay" for all log calls.
//!
//! Without an explicit target, tracing uses the full module path
//! (e.g., "port_relay::server::copier"), which makes filtering and reading
//! the line-oriented output noisier than it needs to be. These macros ensure
//! all logs from this crate use a single "port_relay" target.

macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!(target: "port_relay", $($arg)*) };
}

macro_rules! debug {
    ($($arg:tt)*) => { ::tracing::debug!(target: "port_relay", $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { ::tracing::info!(target: "port_relay", $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { ::tracing::warn!(target: "port_relay", $($arg)*) };
}

macro_rules! error {
    ($($arg:tt)*) => { ::tracing::error!(target: "port_relay", $($arg)*) };
}
