//! Test doubles and common utilities for engine contract tests
//!
//! The doubles record every call so tests can assert exactly which
//! provider operations a cycle performed.

#![allow(dead_code)]

use naddns_core::error::{Error, Result};
use naddns_core::traits::{DnsProvider, DnsRecord, IpSource, IpVersion, NewRecord, RecordUpdate};
use naddns_core::{DdnsConfig, Hostname, RecordType};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ZONE_ID: &str = "zone-123";

/// An IP source returning a settable address
#[derive(Clone)]
pub struct StaticIpSource {
    ip: Arc<Mutex<IpAddr>>,
    requested: Arc<Mutex<Vec<IpVersion>>>,
}

impl StaticIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip: Arc::new(Mutex::new(ip)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change the address returned from now on
    pub fn set_ip(&self, ip: IpAddr) {
        *self.ip.lock().unwrap() = ip;
    }

    /// Families requested so far, in order
    pub fn requested(&self) -> Vec<IpVersion> {
        self.requested.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        self.requested.lock().unwrap().push(version);
        Ok(*self.ip.lock().unwrap())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An IP source whose echo service is always down
#[derive(Clone, Default)]
pub struct FailingIpSource {
    calls: Arc<AtomicUsize>,
}

impl FailingIpSource {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self, _version: IpVersion) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::discovery("connection refused"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// A provider call as observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ZoneId(String),
    List {
        zone_id: String,
        name: String,
        record_type: RecordType,
    },
    Create(NewRecord),
    Update {
        record_id: String,
        update: RecordUpdate,
    },
}

/// An in-memory provider holding one zone
#[derive(Clone)]
pub struct MockDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    fail_on: Arc<Mutex<Option<&'static str>>>,
    list_delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Arc::new(Mutex::new(None)),
            list_delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Seed the zone with an existing record
    pub fn with_record(self, id: &str, name: &str, content: &str) -> Self {
        self.records.lock().unwrap().push(DnsRecord {
            id: id.to_string(),
            record_type: "A".to_string(),
            name: name.to_string(),
            content: content.to_string(),
            comment: None,
            proxied: false,
        });
        self
    }

    /// Make `list_records` take this long
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Fail the named operation ("zone", "list", "create", "update")
    pub fn fail_on(&self, operation: &'static str) {
        *self.fail_on.lock().unwrap() = Some(operation);
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<NewRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Create(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn update_calls(&self) -> Vec<(String, RecordUpdate)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Update { record_id, update } => Some((record_id, update)),
                _ => None,
            })
            .collect()
    }

    pub fn list_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ProviderCall::List { .. }))
            .count()
    }

    /// Number of write calls (create + update)
    pub fn write_count(&self) -> usize {
        self.create_calls().len() + self.update_calls().len()
    }

    /// Highest number of overlapping `list_records` calls seen
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if *self.fail_on.lock().unwrap() == Some(operation) {
            return Err(Error::provider("mock", format!("{} unavailable", operation)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(ProviderCall::ZoneId(zone_name.to_string()));
        self.check("zone")?;
        Ok(ZONE_ID.to_string())
    }

    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>> {
        self.calls.lock().unwrap().push(ProviderCall::List {
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            record_type,
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check("list")?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.name == name)
            .cloned()
            .collect())
    }

    async fn create_record(&self, _zone_id: &str, record: &NewRecord) -> Result<DnsRecord> {
        self.calls
            .lock()
            .unwrap()
            .push(ProviderCall::Create(record.clone()));
        self.check("create")?;

        let stored = DnsRecord {
            id: format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            record_type: record.record_type.to_string(),
            name: record.name.clone(),
            content: record.content.clone(),
            comment: Some(record.comment.clone()),
            proxied: record.proxied,
        };
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        self.calls.lock().unwrap().push(ProviderCall::Update {
            record_id: record_id.to_string(),
            update: update.clone(),
        });
        self.check("update")?;

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|record| record.id == record_id)
            .ok_or_else(|| Error::not_found(format!("record {}", record_id)))?;
        record.content = update.content.clone();
        record.comment = Some(update.comment.clone());
        record.proxied = update.proxied;
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(hostname: &str) -> DdnsConfig {
    DdnsConfig::new("test-token", Hostname::parse(hostname).expect("valid hostname"))
}

pub fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::from([a, b, c, d])
}
