// # HTTP IP Source
//
// This crate discovers the host's public address through a plain-text
// echo service (icanhazip by default).
//
// ## Behavior
//
// - One GET per call to the family-specific endpoint
//   (`ipv4.icanhazip.com` for A records, `ipv6.icanhazip.com` for AAAA)
// - The whole body is read, trailing whitespace trimmed, and parsed as an
//   IP literal of the requested family
// - Every request is bounded by the client timeout
// - No retry, no caching: the next scheduled cycle is the retry

use naddns_core::traits::{IpSource, IpVersion};
use naddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// IPv4 echo endpoint
pub const DEFAULT_IPV4_ENDPOINT: &str = "https://ipv4.icanhazip.com";

/// IPv6 echo endpoint
pub const DEFAULT_IPV6_ENDPOINT: &str = "https://ipv6.icanhazip.com";

/// HTTP echo-service IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// Endpoint queried for IPv4
    ipv4_url: String,

    /// Endpoint queried for IPv6
    ipv6_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source using the icanhazip endpoints
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_endpoints(DEFAULT_IPV4_ENDPOINT, DEFAULT_IPV6_ENDPOINT, timeout)
    }

    /// Create a source with custom endpoints
    pub fn with_endpoints(
        ipv4_url: impl Into<String>,
        ipv6_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client,
        })
    }

    /// The endpoint queried for `version`
    pub fn endpoint(&self, version: IpVersion) -> &str {
        match version {
            IpVersion::V4 => &self.ipv4_url,
            IpVersion::V6 => &self.ipv6_url,
        }
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        let url = self.endpoint(version);
        tracing::debug!("Querying {} for the public {} address", url, version);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::discovery(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::discovery(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        // Consumes the response; the connection is released once the body is read
        let body = response
            .text()
            .await
            .map_err(|e| Error::discovery(format!("Failed to read response from {}: {}", url, e)))?;

        parse_address(&body, version)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Parse an echo-service body into an address of `version`
fn parse_address(body: &str, version: IpVersion) -> Result<IpAddr> {
    let text = body.trim_end();

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::discovery(format!("Invalid IP address: '{}'", text)))?;

    if !version.matches(&ip) {
        return Err(Error::discovery(format!("Expected {}, got: {}", version, ip)));
    }

    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_family_selects_endpoint() {
        let source = HttpIpSource::new(Duration::from_secs(10)).unwrap();

        assert_eq!(source.endpoint(IpVersion::V4), "https://ipv4.icanhazip.com");
        assert_eq!(source.endpoint(IpVersion::V6), "https://ipv6.icanhazip.com");
        assert_eq!(
            source.endpoint(naddns_core::RecordType::A.ip_version()),
            DEFAULT_IPV4_ENDPOINT
        );
        assert_eq!(
            source.endpoint(naddns_core::RecordType::Aaaa.ip_version()),
            DEFAULT_IPV6_ENDPOINT
        );
    }

    #[test]
    fn trailing_newline_is_trimmed() {
        assert_eq!(
            parse_address("203.0.113.7\n", IpVersion::V4).unwrap(),
            IpAddr::from([203, 0, 113, 7])
        );
        assert_eq!(
            parse_address("2001:db8::1\r\n", IpVersion::V6).unwrap(),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn garbage_and_wrong_family_are_discovery_errors() {
        assert!(matches!(
            parse_address("<html>oops</html>", IpVersion::V4),
            Err(Error::Discovery(_))
        ));
        assert!(matches!(
            parse_address("2001:db8::1\n", IpVersion::V4),
            Err(Error::Discovery(_))
        ));
        assert!(matches!(parse_address("", IpVersion::V6), Err(Error::Discovery(_))));
    }
}
