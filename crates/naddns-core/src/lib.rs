// # naddns-core
//
// Core library for the na.DDNS updater.
//
// ## Architecture Overview
//
// One record, one zone, one provider. Every cycle is a fresh, stateless
// comparison between what the provider holds and what the host's public
// address is right now:
//
// - **Hostname**: `record.domain.tld` split into record name and zone name
// - **IpSource**: Trait for discovering the current public address
// - **DnsProvider**: Trait for the four provider calls (zone, list, create, update)
// - **DdnsEngine**: Reconcile decision plus the interval run loop
// - **DdnsConfig**: Immutable configuration built once from the environment
//
// ## Design Principles
//
// 1. **Stateless cycles**: Nothing is cached between cycles; the provider is re-listed every time
// 2. **At most one cycle in flight**: Cycles run inline on the loop task
// 3. **Only startup is fatal**: After the loop starts, failures are logged and retried next tick
// 4. **Library-First**: The daemon is a thin shell around this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod hostname;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, RecordType, RunMode};
pub use engine::{DdnsEngine, EngineEvent, ReconcileOutcome};
pub use error::{Error, Result};
pub use hostname::Hostname;
pub use traits::{DnsProvider, DnsRecord, IpSource, IpVersion, NewRecord, RecordUpdate};
