//! Core traits for na.DDNS
//!
//! - [`IpSource`]: Discover the current public address
//! - [`DnsProvider`]: The four provider calls the reconciler needs

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{DnsProvider, DnsRecord, NewRecord, RecordUpdate};
pub use ip_source::{IpSource, IpVersion};
