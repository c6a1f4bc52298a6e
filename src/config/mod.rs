//! Configuration module for port-relay
//!
//! The listen port is never configured here; it always comes from the
//! descriptor file. Configuration covers the bind policy and the optional
//! hardening knobs (timeouts, connection cap), all of which default to the
//! reference behavior: wildcard bind, no timeouts, unlimited sessions.
//!
//! ```yaml
//! server:
//!   bind: bridge
//!   bridge_interface: "WSL"
//!   connect_timeout_secs: 10
//!   idle_timeout_secs: 300
//!   max_connections: 256
//! ```

mod loader;
mod types;

pub use loader::{apply_env_overrides, default_config, load_config, load_config_from_str};
pub use types::*;
