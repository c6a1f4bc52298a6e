//! Configuration loader

use super::{BindPolicy, Config};
use crate::error::{RelayError, Result};
use std::path::Path;

/// Load configuration from a YAML file
///
/// Also applies PORT_RELAY_* env var overrides after loading.
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    let mut config: Config = serde_yaml::from_str(&contents)?;
    apply_env_overrides(&mut config);
    config.validate().map_err(RelayError::Config)?;
    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
///
/// Also applies PORT_RELAY_* env var overrides after loading.
pub fn load_config_from_str(yaml: &str) -> Result<Config> {
    let mut config: Config = serde_yaml::from_str(yaml)?;
    apply_env_overrides(&mut config);
    config.validate().map_err(RelayError::Config)?;
    Ok(config)
}

/// Build the default configuration, used when no config file is given.
///
/// Env var overrides still apply.
pub fn default_config() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    config.validate().map_err(RelayError::Config)?;
    Ok(config)
}

/// Apply PORT_RELAY_* environment variable overrides to a config.
///
/// Any set env var overrides the corresponding config value.
///
/// Supported env vars:
/// - `PORT_RELAY_BIND` - Override bind policy ("wildcard" or "bridge")
/// - `PORT_RELAY_BRIDGE_INTERFACE` - Override bridge interface substring
/// - `PORT_RELAY_CONNECT_TIMEOUT_SECS` - Override upstream connect timeout
/// - `PORT_RELAY_IDLE_TIMEOUT_SECS` - Override idle read timeout
/// - `PORT_RELAY_MAX_CONNECTIONS` - Override max concurrent sessions
/// - `PORT_RELAY_LOG_LEVEL` - Override log level
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("PORT_RELAY_BIND") {
        match val.to_ascii_lowercase().as_str() {
            "wildcard" => {
                debug!("Overriding bind policy from PORT_RELAY_BIND");
                config.server.bind = BindPolicy::Wildcard;
            }
            "bridge" => {
                debug!("Overriding bind policy from PORT_RELAY_BIND");
                config.server.bind = BindPolicy::Bridge;
            }
            other => {
                warn!("Ignoring PORT_RELAY_BIND with unknown policy {:?}", other);
            }
        }
    }
    if let Ok(val) = std::env::var("PORT_RELAY_BRIDGE_INTERFACE") {
        debug!("Overriding bridge_interface from PORT_RELAY_BRIDGE_INTERFACE");
        config.server.bridge_interface = val;
    }
    if let Ok(val) = std::env::var("PORT_RELAY_CONNECT_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse::<u64>() {
            debug!("Overriding connect_timeout from PORT_RELAY_CONNECT_TIMEOUT_SECS");
            config.server.connect_timeout_secs = secs;
        }
    }
    if let Ok(val) = std::env::var("PORT_RELAY_IDLE_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse::<u64>() {
            debug!("Overriding idle_timeout from PORT_RELAY_IDLE_TIMEOUT_SECS");
            config.server.idle_timeout_secs = secs;
        }
    }
    if let Ok(val) = std::env::var("PORT_RELAY_MAX_CONNECTIONS") {
        if let Ok(max) = val.parse::<usize>() {
            debug!("Overriding max_connections from PORT_RELAY_MAX_CONNECTIONS");
            config.server.max_connections = max;
        }
    }
    if let Ok(val) = std::env::var("PORT_RELAY_LOG_LEVEL") {
        debug!("Overriding log level from PORT_RELAY_LOG_LEVEL");
        config.logging.level = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that set PORT_RELAY_* vars must not interleave with tests that
    // load config, since loading reads the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_load_config_empty_yields_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.server.bind, BindPolicy::Wildcard);
        assert_eq!(config.server.bridge_interface, "WSL");
        assert_eq!(config.server.connect_timeout_secs, 0);
        assert_eq!(config.server.idle_timeout_secs, 0);
        assert_eq!(config.server.max_connections, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_full() {
        let _guard = ENV_LOCK.lock().unwrap();
        let yaml = r#"
server:
  bind: bridge
  bridge_interface: "vEthernet"
  connect_timeout_secs: 10
  idle_timeout_secs: 300
  max_connections: 256

logging:
  level: debug
"#;
        let config = load_config_from_str(yaml).unwrap();
        assert_eq!(config.server.bind, BindPolicy::Bridge);
        assert_eq!(config.server.bridge_interface, "vEthernet");
        assert_eq!(config.server.connect_timeout_secs, 10);
        assert_eq!(config.server.idle_timeout_secs, 300);
        assert_eq!(config.server.max_connections, 256);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_config_partial_server() {
        let _guard = ENV_LOCK.lock().unwrap();
        let yaml = r#"
server:
  max_connections: 8
"#;
        let config = load_config_from_str(yaml).unwrap();
        assert_eq!(config.server.max_connections, 8);
        // Untouched fields keep their defaults
        assert_eq!(config.server.bind, BindPolicy::Wildcard);
        assert_eq!(config.server.idle_timeout_secs, 0);
    }

    #[test]
    fn test_load_config_rejects_empty_bridge_interface() {
        let _guard = ENV_LOCK.lock().unwrap();
        let yaml = r#"
server:
  bind: bridge
  bridge_interface: ""
"#;
        let err = load_config_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("bridge_interface"));
    }

    #[test]
    fn test_load_config_rejects_unknown_policy() {
        let yaml = r#"
server:
  bind: broadcast
"#;
        assert!(load_config_from_str(yaml).is_err());
    }

    #[test]
    fn test_env_override_max_connections() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PORT_RELAY_MAX_CONNECTIONS", "17");

        let mut config = Config::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.server.max_connections, 17);

        std::env::remove_var("PORT_RELAY_MAX_CONNECTIONS");
    }

    #[test]
    fn test_env_override_bind_policy() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PORT_RELAY_BIND", "bridge");

        let mut config = Config::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.server.bind, BindPolicy::Bridge);

        std::env::remove_var("PORT_RELAY_BIND");
    }
}
