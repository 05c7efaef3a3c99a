//! Core na.DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Discovering the current public address via IpSource
//! - Looking up the zone and the managed record via DnsProvider
//! - Deciding between create, update and no-op
//! - Re-running that decision on a fixed interval until shutdown
//!
//! ## Cycle Flow
//!
//! ```text
//! IpSource::current ──► DnsProvider::zone_id ──► DnsProvider::list_records
//!                                                        │
//!                  ┌─────────────────────────────────────┼──────────────────────┐
//!                  ▼                                     ▼                      ▼
//!            no record                           one, stale content     one, same content
//!     DnsProvider::create_record           DnsProvider::update_record        no-op
//! ```
//!
//! Calls within a cycle are strictly sequential. A discovery failure stops
//! the cycle before any provider call; a provider failure stops the
//! remaining steps. Neither stops the run loop.

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, IpSource, NewRecord, RecordUpdate};
use chrono::{DateTime, Local};
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Marker written into every record comment
pub const COMMENT_MARKER: &str = "na.DDNS";

/// Default capacity of the engine event channel
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No record existed; one was created
    Created {
        /// The record as stored by the provider
        record: DnsRecord,
    },
    /// The record pointed elsewhere and was updated in place
    Updated {
        /// The provider-assigned id of the updated record
        record_id: String,
        /// Content before the update
        previous_content: String,
        /// The address now stored
        new_ip: IpAddr,
    },
    /// The record already pointed at the current address
    Unchanged {
        /// The current address
        current_ip: IpAddr,
    },
}

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run loop started
    Started {
        hostname: String,
        interval: Duration,
    },

    /// A cycle began
    CycleStarted { hostname: String },

    /// Record was created
    RecordCreated { hostname: String, new_ip: IpAddr },

    /// Record was updated
    RecordUpdated {
        hostname: String,
        previous_content: String,
        new_ip: IpAddr,
    },

    /// Record was already correct
    RecordUnchanged { hostname: String, current_ip: IpAddr },

    /// A cycle failed; it will be retried on the next tick
    CycleFailed { hostname: String, error: String },

    /// Run loop stopped
    Stopped { reason: String },
}

/// Core na.DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Either call [`DdnsEngine::run_once()`] or [`DdnsEngine::run()`]
/// 3. `run()` returns once its shutdown future resolves
///
/// ## Concurrency
///
/// At most one cycle is in flight at any time. The run loop executes
/// cycles inline, and concurrent [`DdnsEngine::run_once()`] callers queue
/// behind each other.
pub struct DdnsEngine {
    /// Public address discovery
    ip_source: Box<dyn IpSource>,

    /// DNS provider holding the managed record
    provider: Box<dyn DnsProvider>,

    /// Immutable configuration
    config: DdnsConfig,

    /// Serializes cycles
    cycle_lock: Mutex<()>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        Self::with_event_capacity(ip_source, provider, config, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    /// Create a new engine with a custom event channel capacity
    pub fn with_event_capacity(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
        event_capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        if config.polling_interval.is_zero() {
            return Err(Error::config("Polling interval must be > 0"));
        }
        if event_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }

        let (tx, rx) = mpsc::channel(event_capacity);

        let engine = Self {
            ip_source,
            provider,
            config,
            cycle_lock: Mutex::new(()),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &DdnsConfig {
        &self.config
    }

    /// Run the interval loop until `shutdown` resolves
    ///
    /// The first cycle runs immediately, then one per polling interval.
    /// Ticks missed while a slow cycle was running are skipped, never
    /// queued. If shutdown arrives mid-cycle, the cycle gets
    /// `shutdown_grace` to finish before it is dropped.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()> + Send,
    {
        let interval = self.config.polling_interval;
        let grace = self.config.shutdown_grace;

        self.emit_event(EngineEvent::Started {
            hostname: self.config.hostname.to_string(),
            interval,
        });
        info!(
            hostname = %self.config.hostname,
            record_type = %self.config.record_type,
            "Reconciling every {:?}",
            interval
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(ticker);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                Some(_) = ticks.next() => {
                    let cycle = self.run_once();
                    tokio::pin!(cycle);

                    tokio::select! {
                        biased;

                        result = &mut cycle => {
                            if result.is_err() {
                                debug!("Cycle failed, next attempt in {:?}", interval);
                            }
                        }

                        _ = &mut shutdown => {
                            info!("Shutdown signal received mid-cycle, allowing up to {:?} to finish", grace);
                            if tokio::time::timeout(grace, &mut cycle).await.is_err() {
                                warn!("Cycle did not finish within {:?}, abandoning it", grace);
                            }
                            break;
                        }
                    }
                }
            }
        }

        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Engine stopped");
    }

    /// Run a single reconciliation cycle
    ///
    /// Emits cycle events and logs the outcome. Waits for any cycle already
    /// in flight to finish first.
    pub async fn run_once(&self) -> Result<ReconcileOutcome> {
        let _guard = self.cycle_lock.lock().await;
        let hostname = self.config.hostname.to_string();

        self.emit_event(EngineEvent::CycleStarted {
            hostname: hostname.clone(),
        });

        let result = self.reconcile().await;

        match &result {
            Ok(ReconcileOutcome::Created { record }) => {
                info!(
                    "Record Created: '{}' is resolving to '{}'",
                    hostname, record.content
                );
                if let Ok(new_ip) = record.content.parse() {
                    self.emit_event(EngineEvent::RecordCreated {
                        hostname: hostname.clone(),
                        new_ip,
                    });
                }
            }
            Ok(ReconcileOutcome::Updated {
                previous_content,
                new_ip,
                ..
            }) => {
                info!(
                    previous = %previous_content,
                    "Record Updated: '{}' is resolving to '{}'",
                    hostname, new_ip
                );
                self.emit_event(EngineEvent::RecordUpdated {
                    hostname: hostname.clone(),
                    previous_content: previous_content.clone(),
                    new_ip: *new_ip,
                });
            }
            Ok(ReconcileOutcome::Unchanged { current_ip }) => {
                info!(
                    "Record Valid: '{}' is already resolving to '{}'",
                    hostname, current_ip
                );
                self.emit_event(EngineEvent::RecordUnchanged {
                    hostname: hostname.clone(),
                    current_ip: *current_ip,
                });
            }
            Err(e) => {
                self.emit_event(EngineEvent::CycleFailed {
                    hostname: hostname.clone(),
                    error: e.to_string(),
                });
            }
        }

        result
    }

    /// The create/update/no-op decision
    async fn reconcile(&self) -> Result<ReconcileOutcome> {
        let config = &self.config;
        let hostname = config.hostname.as_str();
        let record_type = config.record_type;

        let current_ip = self
            .ip_source
            .current(record_type.ip_version())
            .await
            .inspect_err(|e| {
                error!(
                    hostname,
                    source = self.ip_source.source_name(),
                    "Failed to retrieve public ip: {}",
                    e
                );
            })?;
        debug!(hostname, %current_ip, "Discovered public address");

        let zone_name = config.hostname.zone_name();
        let zone_id = self
            .provider
            .zone_id(zone_name)
            .await
            .inspect_err(|e| self.log_provider_failure("zone lookup", e))?;
        debug!(zone = zone_name, "Resolved zone ID");

        let records = self
            .provider
            .list_records(&zone_id, hostname, record_type)
            .await
            .inspect_err(|e| self.log_provider_failure("list records", e))?;

        match records.as_slice() {
            [] => {
                let record = NewRecord {
                    record_type,
                    name: hostname.to_string(),
                    content: current_ip.to_string(),
                    comment: record_comment(Local::now()),
                    proxied: config.proxied,
                };

                let created = self
                    .provider
                    .create_record(&zone_id, &record)
                    .await
                    .inspect_err(|e| self.log_provider_failure("create record", e))?;

                Ok(ReconcileOutcome::Created { record: created })
            }
            [existing] if content_matches(existing, current_ip) => {
                Ok(ReconcileOutcome::Unchanged { current_ip })
            }
            [existing] => {
                let update = RecordUpdate {
                    record_type,
                    name: hostname.to_string(),
                    content: current_ip.to_string(),
                    comment: record_comment(Local::now()),
                    proxied: config.proxied,
                };

                self.provider
                    .update_record(&zone_id, &existing.id, &update)
                    .await
                    .inspect_err(|e| self.log_provider_failure("update record", e))?;

                Ok(ReconcileOutcome::Updated {
                    record_id: existing.id.clone(),
                    previous_content: existing.content.clone(),
                    new_ip: current_ip,
                })
            }
            many => {
                let err = Error::AmbiguousRecord {
                    name: hostname.to_string(),
                    count: many.len(),
                };
                error!(
                    hostname,
                    ids = ?many.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
                    "{}",
                    err
                );
                Err(err)
            }
        }
    }

    fn log_provider_failure(&self, operation: &str, err: &Error) {
        error!(
            hostname = %self.config.hostname,
            provider = self.provider.provider_name(),
            operation,
            "Provider call failed: {}",
            err
        );
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // A full or closed channel must never stall a cycle
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event");
        }
    }
}

/// Whether the record already holds `ip`
///
/// Compared as addresses so equivalent IPv6 spellings match. Content that
/// isn't an IP literal counts as stale.
fn content_matches(record: &DnsRecord, ip: IpAddr) -> bool {
    record
        .content
        .trim()
        .parse::<IpAddr>()
        .is_ok_and(|current| current == ip)
}

/// Comment stored on every write, e.g. `na.DDNS [2024-05-01 12:30:00]`
pub fn record_comment(now: DateTime<Local>) -> String {
    format!("{} [{}]", COMMENT_MARKER, now.format("%Y-%m-%d %H:%M:%S"))
}
