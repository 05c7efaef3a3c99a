//! Configuration for na.DDNS
//!
//! Configuration is read once from the environment at startup into an
//! immutable [`DdnsConfig`] which the engine borrows on every cycle.
//! Every violation is a [`crate::Error::Config`] (or
//! [`crate::Error::InvalidHostname`]) and stops the process before the loop
//! starts.

use crate::error::{Error, Result};
use crate::hostname::Hostname;
use crate::traits::IpVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Provider API credential (required)
pub const ENV_API_KEY: &str = "CLOUDFLARE_API_KEY";
/// Managed hostname (required)
pub const ENV_DNS_RECORD: &str = "CLOUDFLARE_DNS_RECORD";
/// Record type, `A` or `AAAA`
pub const ENV_DNS_RECORD_TYPE: &str = "CLOUDFLARE_DNS_RECORD_TYPE";
/// Polling interval in minutes, 1..=59
pub const ENV_POLLING_INTERVAL: &str = "POLLING_INTERVAL";
/// Proxied flag for created/updated records
pub const ENV_PROXIED: &str = "PROXIED";
/// Run a single cycle and exit
pub const ENV_RUN_ONCE: &str = "DDNS_RUN_ONCE";
/// `live` or `dry-run`
pub const ENV_MODE: &str = "DDNS_MODE";
/// Timeout for every outbound HTTP call, in seconds
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DDNS_HTTP_TIMEOUT_SECS";
/// How long an in-flight cycle may run after shutdown is requested
pub const ENV_SHUTDOWN_GRACE_SECS: &str = "DDNS_SHUTDOWN_GRACE_SECS";
/// Log level
pub const ENV_LOG_LEVEL: &str = "DDNS_LOG_LEVEL";

const DEFAULT_POLLING_MINUTES: u64 = 3;
const POLLING_MINUTES_RANGE: std::ops::RangeInclusive<u64> = 1..=59;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;
const SECONDS_RANGE: std::ops::RangeInclusive<u64> = 1..=300;

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Address family this record type holds
    pub fn ip_version(self) -> IpVersion {
        match self {
            RecordType::A => IpVersion::V4,
            RecordType::Aaaa => IpVersion::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(Error::config(format!(
                "'{}' must be either 'A' or 'AAAA'. You entered '{}'",
                ENV_DNS_RECORD_TYPE, other
            ))),
        }
    }
}

/// How the daemon drives the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Reconcile on every polling interval until shutdown
    Scheduled,
    /// Reconcile once and exit
    Once,
}

/// Main na.DDNS configuration
#[derive(Clone)]
pub struct DdnsConfig {
    /// Provider API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Hostname kept pointed at the public address
    pub hostname: Hostname,

    /// Record type to manage
    pub record_type: RecordType,

    /// Time between cycles
    pub polling_interval: Duration,

    /// Provider proxy flag applied on create and update
    pub proxied: bool,

    /// Scheduled or one-shot
    pub run_mode: RunMode,

    /// Perform reads only and log intended writes
    pub dry_run: bool,

    /// Timeout for every outbound HTTP call
    pub http_timeout: Duration,

    /// Grace period for an in-flight cycle on shutdown
    pub shutdown_grace: Duration,

    /// Maximum log level
    pub log_level: Level,
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("api_token", &"<REDACTED>")
            .field("hostname", &self.hostname)
            .field("record_type", &self.record_type)
            .field("polling_interval", &self.polling_interval)
            .field("proxied", &self.proxied)
            .field("run_mode", &self.run_mode)
            .field("dry_run", &self.dry_run)
            .field("http_timeout", &self.http_timeout)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything optional
    pub fn new(api_token: impl Into<String>, hostname: Hostname) -> Self {
        Self {
            api_token: api_token.into(),
            hostname,
            record_type: RecordType::A,
            polling_interval: Duration::from_secs(DEFAULT_POLLING_MINUTES * 60),
            proxied: false,
            run_mode: RunMode::Scheduled,
            dry_run: false,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            log_level: Level::INFO,
        }
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Set the polling interval
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Set the proxied flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    /// Set the shutdown grace period
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// The provider API token
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let api_token = get(ENV_API_KEY)
            .ok_or_else(|| Error::config(format!("'{}' env variable missing", ENV_API_KEY)))?;

        let hostname = get(ENV_DNS_RECORD)
            .ok_or_else(|| Error::config(format!("'{}' env variable missing", ENV_DNS_RECORD)))?;
        let hostname = Hostname::parse(&hostname)?;

        let mut config = Self::new(api_token, hostname);

        if let Some(value) = get(ENV_DNS_RECORD_TYPE) {
            config.record_type = value.parse()?;
        }

        if let Some(value) = get(ENV_POLLING_INTERVAL) {
            config.polling_interval = parse_polling_interval(&value)?;
        }

        if let Some(value) = get(ENV_PROXIED) {
            config.proxied = parse_bool(ENV_PROXIED, &value)?;
        }

        if let Some(value) = get(ENV_RUN_ONCE) {
            if parse_bool(ENV_RUN_ONCE, &value)? {
                config.run_mode = RunMode::Once;
            }
        }

        if let Some(value) = get(ENV_MODE) {
            config.dry_run = match value.to_lowercase().as_str() {
                "live" => false,
                "dry-run" => true,
                _ => {
                    return Err(Error::config(format!(
                        "'{}' must be either 'live' or 'dry-run'. You entered '{}'",
                        ENV_MODE, value
                    )));
                }
            };
        }

        if let Some(value) = get(ENV_HTTP_TIMEOUT_SECS) {
            config.http_timeout = parse_seconds(ENV_HTTP_TIMEOUT_SECS, &value)?;
        }

        if let Some(value) = get(ENV_SHUTDOWN_GRACE_SECS) {
            config.shutdown_grace = parse_seconds(ENV_SHUTDOWN_GRACE_SECS, &value)?;
        }

        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level = parse_log_level(&value)?;
        }

        Ok(config)
    }
}

fn parse_polling_interval(value: &str) -> Result<Duration> {
    let minutes: u64 = value.parse().map_err(|_| {
        Error::config(format!(
            "'{}' must be a whole number of minutes. You entered '{}'",
            ENV_POLLING_INTERVAL, value
        ))
    })?;

    if !POLLING_MINUTES_RANGE.contains(&minutes) {
        return Err(Error::config(format!(
            "'{}' must have a value between '{}' and '{}'. You entered '{}'",
            ENV_POLLING_INTERVAL,
            POLLING_MINUTES_RANGE.start(),
            POLLING_MINUTES_RANGE.end(),
            value
        )));
    }

    Ok(Duration::from_secs(minutes * 60))
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration> {
    match value.parse::<u64>() {
        Ok(secs) if SECONDS_RANGE.contains(&secs) => Ok(Duration::from_secs(secs)),
        _ => Err(Error::config(format!(
            "'{}' must be between {} and {} seconds. You entered '{}'",
            key,
            SECONDS_RANGE.start(),
            SECONDS_RANGE.end(),
            value
        ))),
    }
}

/// Accepts `true/t/1` and `false/f/0` in any letter case
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(Error::config(format!(
            "'{}' must either be 'true' or 'false'. You entered '{}'",
            key, value
        ))),
    }
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::config(format!(
            "'{}' '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL, value
        ))),
    }
}
