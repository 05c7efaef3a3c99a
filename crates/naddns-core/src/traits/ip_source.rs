// # IP Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP echo services: `naddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use naddns_core::{IpSource, IpVersion};
//
// let source = /* IpSource implementation */;
// let ip = source.current(IpVersion::V4).await?;
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Whether `ip` belongs to this family
    pub fn matches(self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for public address discovery
///
/// # Contract
///
/// - One attempt per call. No retry, no backoff, no caching; the next
///   scheduled cycle is the retry.
/// - Every outbound call must be bounded by a timeout.
/// - Resources acquired for the call (connections, bodies) are released
///   before returning.
/// - The returned address must belong to the requested family, otherwise
///   the call fails with [`crate::Error::Discovery`].
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Discover the current public address for `version`
    async fn current(&self, version: IpVersion) -> Result<IpAddr, crate::Error>;

    /// Name of the source (for logging)
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_family() {
        let v4 = IpAddr::from([203, 0, 113, 7]);
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert!(IpVersion::V4.matches(&v4));
        assert!(!IpVersion::V4.matches(&v6));
        assert!(IpVersion::V6.matches(&v6));
        assert!(!IpVersion::V6.matches(&v4));
    }
}
