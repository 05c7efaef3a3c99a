// # Cloudflare DNS Provider
//
// This crate implements the four provider calls na.DDNS needs against the
// Cloudflare API v4:
//
// - ✅ Zone lookup by name
// - ✅ Record listing filtered by name and type
// - ✅ Record creation
// - ✅ Record update by id
// - ✅ HTTP timeout on every request
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry or backoff (the next cycle is the retry)
// - ❌ NO caching (every cycle re-lists from Cloudflare)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use naddns_core::traits::{DnsProvider, DnsRecord, NewRecord, RecordUpdate};
use naddns_core::{Error, RecordType, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Provider name used in errors and logs
const PROVIDER_NAME: &str = "cloudflare";

/// Record id reported for writes skipped in dry-run mode
const DRY_RUN_RECORD_ID: &str = "dry-run";

/// Standard Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
    name: String,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record listing)
/// - Log the intended create/update payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    /// - `dry_run`: If true, perform reads but skip writes
    /// - `timeout`: Timeout applied to every request
    pub fn new(api_token: impl Into<String>, dry_run: bool, timeout: Duration) -> Result<Self> {
        let api_token = api_token.into();

        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    /// Send one authenticated request and unwrap the Cloudflare envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, operation: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", operation, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{} response unreadable: {}", operation, e)))?;

        if !status.is_success() {
            return Err(status_error(status, operation, &body));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("{} rejected: {}", operation, join_messages(&envelope.errors)),
            ));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER_NAME, format!("{} response has no result", operation))
        })
    }
}

/// Map a non-2xx response to an error
fn status_error(status: StatusCode, operation: &str, body: &str) -> Error {
    let detail = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .filter(|envelope| !envelope.errors.is_empty())
        .map(|envelope| join_messages(&envelope.errors))
        .unwrap_or_else(|| body.to_string());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions. Status: {}",
            operation, status
        )),
        404 => Error::not_found(format!("{}: {} - {}", operation, status, detail)),
        409 => Error::provider(
            PROVIDER_NAME,
            format!("{}: conflict, record is being changed elsewhere. Status: {}", operation, status),
        ),
        429 => Error::rate_limited(format!("{}: retry on the next cycle. Status: {}", operation, status)),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("{}: Cloudflare server error (transient): {} - {}", operation, status, detail),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", operation, status, detail),
        ),
    }
}

fn join_messages(messages: &[ApiMessage]) -> String {
    if messages.is_empty() {
        return "no error details".to_string();
    }

    messages
        .iter()
        .map(|m| format!("[{}] {}", m.code, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);

        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .query(&[("name", zone_name)]);

        let zones: Vec<Zone> = self.send(request, "Zone lookup").await?;

        let zone = zones
            .into_iter()
            .find(|zone| zone.name.eq_ignore_ascii_case(zone_name))
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing {} records named {}", record_type, name);

        let request = self
            .client
            .get(self.records_url(zone_id))
            .query(&[("name", name), ("type", record_type.as_str())]);

        let records: Vec<DnsRecord> = self.send(request, "Record listing").await?;

        tracing::debug!("Found {} matching record(s)", records.len());
        Ok(records)
    }

    async fn create_record(&self, zone_id: &str, record: &NewRecord) -> Result<DnsRecord> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                self.records_url(zone_id),
                serde_json::to_string(record)?
            );
            return Ok(DnsRecord {
                id: DRY_RUN_RECORD_ID.to_string(),
                record_type: record.record_type.to_string(),
                name: record.name.clone(),
                content: record.content.clone(),
                comment: Some(record.comment.clone()),
                proxied: record.proxied,
            });
        }

        let request = self.client.post(self.records_url(zone_id)).json(record);
        let created: DnsRecord = self.send(request, "Record creation").await?;

        tracing::debug!("Created record {} ({})", created.name, created.id);
        Ok(created)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        let url = format!("{}/{}", self.records_url(zone_id), record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH request to {} with payload: {}",
                url,
                serde_json::to_string(update)?
            );
            return Ok(DnsRecord {
                id: record_id.to_string(),
                record_type: update.record_type.to_string(),
                name: update.name.clone(),
                content: update.content.clone(),
                comment: Some(update.comment.clone()),
                proxied: update.proxied,
            });
        }

        let request = self.client.patch(url).json(update);
        let updated: DnsRecord = self.send(request, "Record update").await?;

        tracing::debug!("Updated record {} ({})", updated.name, updated.id);
        Ok(updated)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
