//! Local interface enumeration for discovery.

use std::io;
use std::net::{IpAddr, Ipv4Addr};

/// Supplies the local IPv4 addresses a probe should be sent from.
#[cfg_attr(test, mockall::automock)]
pub trait InterfaceSource: Send + Sync {
    /// Addresses to probe from, already filtered and in a stable order.
    fn probe_addresses(&self) -> io::Result<Vec<Ipv4Addr>>;
}

/// Reads the host's interfaces and keeps the [`eligible_addresses`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn probe_addresses(&self) -> io::Result<Vec<Ipv4Addr>> {
        let all: Vec<IpAddr> = if_addrs::get_if_addrs()?
            .into_iter()
            .map(|iface| iface.ip())
            .collect();
        Ok(eligible_addresses(&all))
    }
}

/// Keeps IPv4 addresses that are neither loopback nor link-local.
///
/// Duplicates are dropped; the first occurrence keeps its position.
pub fn eligible_addresses(addresses: &[IpAddr]) -> Vec<Ipv4Addr> {
    let mut out = Vec::new();
    for addr in addresses {
        let IpAddr::V4(v4) = addr else { continue };
        if v4.is_loopback() || v4.is_link_local() || out.contains(v4) {
            continue;
        }
        out.push(*v4);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_eligible_addresses_filters_loopback_link_local_and_ipv6() {
        // Arrange
        let input = [
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(169, 254, 10, 1)),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
            IpAddr::V6("fe80::1".parse().unwrap()),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        ];

        // Act
        let eligible = eligible_addresses(&input);

        // Assert
        assert_eq!(
            eligible,
            vec![Ipv4Addr::new(192, 168, 1, 20), Ipv4Addr::new(10, 0, 0, 2)]
        );
    }

    #[test]
    fn test_eligible_addresses_drops_duplicates() {
        let a = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(eligible_addresses(&[a, a]).len(), 1);
    }

    #[test]
    fn test_eligible_addresses_of_nothing_is_empty() {
        assert!(eligible_addresses(&[]).is_empty());
    }

    #[test]
    fn test_system_interfaces_never_yields_loopback() {
        // Host-dependent; only the filter invariant is asserted.
        if let Ok(addrs) = SystemInterfaces.probe_addresses() {
            assert!(addrs.iter().all(|a| !a.is_loopback() && !a.is_link_local()));
        }
    }
}
