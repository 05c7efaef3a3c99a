//! Managed hostname
//!
//! The updater manages exactly one name of the form `record.domain.tld`.
//! The first label is the record name; the last two form the zone.

use crate::error::{Error, Result};
use std::fmt;

/// Maximum length of a full name (RFC 1035)
const MAX_NAME_LEN: usize = 253;

/// Maximum length of one label (RFC 1035)
const MAX_LABEL_LEN: usize = 63;

/// Number of labels a managed hostname must have
const REQUIRED_LABELS: usize = 3;

/// A validated `record.domain.tld` hostname
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname {
    fqdn: String,
    record_name: String,
    zone_name: String,
}

impl Hostname {
    /// Parse and validate a hostname
    ///
    /// Accepts exactly three non-empty labels. Bare domains, deeper names,
    /// trailing dots and the empty string are rejected with
    /// [`Error::InvalidHostname`] naming the input.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::invalid_hostname(input, "hostname is empty"));
        }

        if input.len() > MAX_NAME_LEN {
            return Err(Error::invalid_hostname(
                input,
                format!("{} chars exceeds the {} char limit", input.len(), MAX_NAME_LEN),
            ));
        }

        let labels: Vec<&str> = input.split('.').collect();
        if labels.len() != REQUIRED_LABELS {
            return Err(Error::invalid_hostname(
                input,
                format!(
                    "expected {} labels (record.domain.tld), got {}",
                    REQUIRED_LABELS,
                    labels.len()
                ),
            ));
        }

        for label in &labels {
            validate_label(input, label)?;
        }

        Ok(Self {
            fqdn: input.to_string(),
            record_name: labels[0].to_string(),
            zone_name: labels[1..].join("."),
        })
    }

    /// The full name, e.g. `host.example.com`
    pub fn as_str(&self) -> &str {
        &self.fqdn
    }

    /// The first label, e.g. `host`
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// The zone the record lives in, e.g. `example.com`
    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn)
    }
}

impl std::str::FromStr for Hostname {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn validate_label(input: &str, label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::invalid_hostname(input, "hostname has an empty label"));
    }

    if label.len() > MAX_LABEL_LEN {
        return Err(Error::invalid_hostname(
            input,
            format!("label '{}' is longer than {} chars", label, MAX_LABEL_LEN),
        ));
    }

    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(Error::invalid_hostname(
            input,
            format!("label '{}' may only contain letters, digits and hyphens", label),
        ));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(Error::invalid_hostname(
            input,
            format!("label '{}' cannot start or end with a hyphen", label),
        ));
    }

    Ok(())
}
