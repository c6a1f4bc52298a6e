//! Bind address selection
//!
//! The wildcard policy accepts on all interfaces and dials the upstream on
//! loopback. The bridge policy is for hosts that expose the upstream behind a
//! virtualization bridge: it picks the first IPv4 address of an interface
//! whose name contains a configured substring and uses it for both the
//! listener bind and the upstream dial target.

use std::net::{IpAddr, Ipv4Addr};

use crate::config::BindPolicy;
use crate::error::{RelayError, Result};

/// Addresses resolved from a bind policy at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindSelection {
    /// Address the listener binds to
    pub bind_addr: IpAddr,
    /// Address sessions dial to reach the upstream
    pub upstream_addr: IpAddr,
}

/// Resolve the listener bind address and the upstream dial address.
///
/// Queried once at startup; the bridge policy fails with
/// [`RelayError::NoMatchingInterface`] when no interface matches, and the
/// caller decides whether to fall back to the wildcard policy.
pub fn resolve_bind(policy: BindPolicy, bridge_substr: &str) -> Result<BindSelection> {
    match policy {
        BindPolicy::Wildcard => Ok(BindSelection {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            upstream_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }),
        BindPolicy::Bridge => {
            let addr = bridge_interface_addr(bridge_substr)?;
            Ok(BindSelection {
                bind_addr: IpAddr::V4(addr),
                upstream_addr: IpAddr::V4(addr),
            })
        }
    }
}

/// First IPv4 address on an interface whose name contains `substr`.
fn bridge_interface_addr(substr: &str) -> Result<Ipv4Addr> {
    let interfaces = get_if_addrs::get_if_addrs()?;
    for iface in &interfaces {
        if !iface.name.contains(substr) {
            continue;
        }
        if let IpAddr::V4(addr) = iface.ip() {
            debug!("Selected {} on bridge interface {}", addr, iface.name);
            return Ok(addr);
        }
    }
    Err(RelayError::NoMatchingInterface(format!(
        "no IPv4 address on an interface matching {:?}",
        substr
    )))
}
