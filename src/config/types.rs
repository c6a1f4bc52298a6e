//! Configuration types

use serde::Deserialize;

/// Root configuration structure
///
/// All fields have defaults, so an empty config file (or no config file at
/// all) yields the reference behavior: wildcard bind, no timeouts, no
/// connection cap.
///
/// # Example
///
/// ```yaml
/// server:
///   bind: bridge
///   bridge_interface: "WSL"
///   max_connections: 256
///
/// logging:
///   level: debug
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind == BindPolicy::Bridge && self.server.bridge_interface.is_empty() {
            return Err("bridge bind policy requires a non-empty bridge_interface".to_string());
        }
        Ok(())
    }
}

/// Listener bind policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindPolicy {
    /// Bind all local interfaces and dial the upstream on loopback
    Wildcard,
    /// Bind the first IPv4 address of an interface whose name contains
    /// `bridge_interface`, and dial the upstream on that same address
    Bridge,
}

/// Server listener configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind policy for the listener
    #[serde(default = "default_bind_policy")]
    pub bind: BindPolicy,
    /// Interface name substring used by the bridge bind policy
    #[serde(default = "default_bridge_interface")]
    pub bridge_interface: String,
    /// Upstream connect timeout in seconds (0 = no timeout)
    #[serde(default)]
    pub connect_timeout_secs: u64,
    /// Idle read timeout per copy direction in seconds (0 = disabled)
    #[serde(default)]
    pub idle_timeout_secs: u64,
    /// Maximum number of concurrent sessions (0 = unlimited)
    #[serde(default)]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_policy(),
            bridge_interface: default_bridge_interface(),
            connect_timeout_secs: 0,
            idle_timeout_secs: 0,
            max_connections: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_policy() -> BindPolicy {
    BindPolicy::Wildcard
}

fn default_bridge_interface() -> String {
    "WSL".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
