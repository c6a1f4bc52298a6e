//! Error types for port-relay

use thiserror::Error;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// I/O error (network, file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Descriptor contents did not yield a usable port
    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),

    /// No network interface satisfied the bridge bind policy
    #[error("No matching interface: {0}")]
    NoMatchingInterface(String),

    /// Could not establish the listener
    #[error("Bind error: {0}")]
    Bind(String),

    /// Upstream dial failed for a session
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),
}

/// Result type alias for RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

impl From<serde_yaml::Error> for RelayError {
    fn from(err: serde_yaml::Error) -> Self {
        RelayError::Config(err.to_string())
    }
}
