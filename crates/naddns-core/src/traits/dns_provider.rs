// # DNS Provider Trait
//
// Defines the four provider calls the reconciler depends on.
//
// ## Implementations
//
// - Cloudflare: `naddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use naddns_core::DnsProvider;
//
// let zone_id = provider.zone_id("example.com").await?;
// let records = provider.list_records(&zone_id, "host.example.com", RecordType::A).await?;
// ```

use crate::config::RecordType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A DNS record as held by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier
    pub id: String,
    /// Record type as reported by the provider (e.g. "A")
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content (an IP literal for A/AAAA)
    pub content: String,
    /// Free-text comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Whether traffic is routed through the provider's edge
    #[serde(default)]
    pub proxied: bool,
}

/// Payload for creating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub content: String,
    pub comment: String,
    pub proxied: bool,
}

/// Payload for updating a record in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub content: String,
    pub comment: String,
    pub proxied: bool,
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - Each method performs exactly one API call.
/// - No retry, backoff, caching or background tasks. The engine decides
///   what to call and when; a failed call is retried on the next cycle.
/// - Credentials never appear in logs, errors or `Debug` output.
/// - Every call is bounded by a request timeout.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve the provider's zone identifier for `zone_name`
    ///
    /// Fails with [`crate::Error::NotFound`] when the zone doesn't exist.
    async fn zone_id(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// List records in `zone_id` named `name` with type `record_type`
    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record, returning it as stored by the provider
    async fn create_record(
        &self,
        zone_id: &str,
        record: &NewRecord,
    ) -> Result<DnsRecord, crate::Error>;

    /// Update record `record_id` in place, returning the stored record
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
