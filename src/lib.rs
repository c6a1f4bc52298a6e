//! port-relay - Local TCP relay driven by a descriptor file
//!
//! This library provides the core functionality for a relay that:
//! - Scrapes the upstream TCP port from a descriptor file
//! - Binds a listener on that port (wildcard or bridge-interface address)
//! - Forwards every accepted connection to the upstream at the same port
//! - Copies bytes in both directions until either side closes, with the
//!   half-close of one direction cascading into full teardown
//!
//! The forwarded bytes are never inspected or modified.

#[macro_use]
mod logging;

pub mod config;
pub mod descriptor;
pub mod error;
pub mod netif;
pub mod server;

pub use config::{BindPolicy, Config};
pub use error::{RelayError, Result};
pub use netif::BindSelection;
pub use server::{Relay, RelayStats};
