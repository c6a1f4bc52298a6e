//! Port extraction from descriptor files
//!
//! The agent endpoint publishes the upstream port inside a small text file.
//! The only structure we rely on is a `>` immediately followed by decimal
//! digits and trailing whitespace, e.g. `agent>4287 pid=123`.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RelayError, Result};

/// First run of digits preceded by `>` and followed by whitespace.
static PORT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r">(\d+)\s").unwrap());

/// Extract the upstream TCP port from descriptor contents.
///
/// Only the first match is considered; a match outside 1-65535 is an error,
/// not a reason to keep scanning.
pub fn resolve_port(contents: &str) -> Result<u16> {
    let captures = PORT_PATTERN
        .captures(contents)
        .ok_or_else(|| RelayError::MalformedDescriptor("no port marker found".to_string()))?;
    let digits = &captures[1];

    match digits.parse::<u32>() {
        Ok(port) if port >= 1 && port <= u16::MAX as u32 => Ok(port as u16),
        _ => Err(RelayError::MalformedDescriptor(format!(
            "port out of range: {}",
            digits
        ))),
    }
}

/// Read a descriptor file and extract the upstream port from it.
pub fn read_port(path: &Path) -> Result<u16> {
    let contents = std::fs::read_to_string(path)?;
    resolve_port(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_port_agent_line() {
        assert_eq!(resolve_port("agent>4287 pid=123").unwrap(), 4287);
    }

    #[test]
    fn test_resolve_port_multiline() {
        let contents = "state=ready\nlistener>9000\nttl=60\n";
        assert_eq!(resolve_port(contents).unwrap(), 9000);
    }

    #[test]
    fn test_resolve_port_first_match_wins() {
        assert_eq!(resolve_port("a>1111 b>2222 ").unwrap(), 1111);
    }

    #[test]
    fn test_resolve_port_skips_non_terminated_runs() {
        // ">12x" is not digits-then-whitespace, so the scan moves on
        assert_eq!(resolve_port("v>12x p>34 ").unwrap(), 34);
    }

    #[test]
    fn test_resolve_port_no_marker() {
        let err = resolve_port("no digits here").unwrap_err();
        assert!(matches!(err, RelayError::MalformedDescriptor(_)));
    }

    #[test]
    fn test_resolve_port_requires_trailing_whitespace() {
        let err = resolve_port("agent>4287").unwrap_err();
        assert!(matches!(err, RelayError::MalformedDescriptor(_)));
    }

    #[test]
    fn test_resolve_port_rejects_zero() {
        let err = resolve_port("agent>0 ").unwrap_err();
        assert!(matches!(err, RelayError::MalformedDescriptor(_)));
    }

    #[test]
    fn test_resolve_port_rejects_out_of_range() {
        let err = resolve_port("agent>70000 ").unwrap_err();
        assert!(matches!(err, RelayError::MalformedDescriptor(_)));
    }

    #[test]
    fn test_resolve_port_rejects_overflowing_digits() {
        let err = resolve_port("agent>99999999999999999999 ").unwrap_err();
        assert!(matches!(err, RelayError::MalformedDescriptor(_)));
    }

    #[test]
    fn test_resolve_port_max_port() {
        assert_eq!(resolve_port(">65535\n").unwrap(), 65535);
    }
}
