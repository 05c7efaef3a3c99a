// # naddnsd - na.DDNS Daemon
//
// Thin integration layer: all reconciliation logic lives in naddns-core.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP IP source and the Cloudflare provider into the engine
// 4. Running one cycle or the interval loop until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Required
// - `CLOUDFLARE_API_KEY`: API token with Zone:Read and DNS:Edit permissions
// - `CLOUDFLARE_DNS_RECORD`: Managed hostname, exactly `record.domain.tld`
//
// ### Optional
// - `CLOUDFLARE_DNS_RECORD_TYPE`: `A` (default) or `AAAA`
// - `POLLING_INTERVAL`: Minutes between cycles, 1-59 (default 3)
// - `PROXIED`: Route traffic through Cloudflare (default false)
// - `DDNS_RUN_ONCE`: Run a single cycle and exit (default false)
// - `DDNS_MODE`: `live` (default) or `dry-run`
// - `DDNS_HTTP_TIMEOUT_SECS`: Per-request timeout, 1-300 (default 30)
// - `DDNS_SHUTDOWN_GRACE_SECS`: Grace for an in-flight cycle, 1-300 (default 30)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_KEY=your_token
// export CLOUDFLARE_DNS_RECORD=home.example.com
// export POLLING_INTERVAL=5
//
// naddnsd
// ```

use anyhow::{Context, Result};
use naddns_core::{DdnsConfig, DdnsEngine, EngineEvent, RunMode};
use naddns_ip_http::HttpIpSource;
use naddns_provider_cloudflare::CloudflareProvider;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown, or a successful single cycle
/// - 1: Configuration or startup error
/// - 2: Runtime error, including a failed single cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let config = match DdnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting naddnsd");
    debug!("Configuration loaded: {:?}", config);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Wire the engine and drive it until it finishes
async fn run_daemon(config: DdnsConfig) -> DdnsExitCode {
    let (engine, events) = match build_engine(config) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return exit_code_for(&e);
        }
    };

    let reporter = tokio::spawn(report_events(events));

    let code = match engine.config().run_mode {
        RunMode::Once => match engine.run_once().await {
            Ok(_) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Single cycle failed: {}", e);
                exit_code_for(&e.into())
            }
        },
        RunMode::Scheduled => {
            info!(
                "na.DDNS started: managing {} record '{}'",
                engine.config().record_type,
                engine.config().hostname
            );
            engine.run(shutdown_signal()).await;
            DdnsExitCode::CleanShutdown
        }
    };

    // Dropping the engine closes the event channel and ends the reporter
    drop(engine);
    if let Err(e) = reporter.await {
        warn!("Event reporter ended abnormally: {}", e);
    }

    info!("naddnsd stopped");
    code
}

/// Build the IP source, the provider and the engine from configuration
fn build_engine(config: DdnsConfig) -> Result<(DdnsEngine, mpsc::Receiver<EngineEvent>)> {
    let ip_source =
        HttpIpSource::new(config.http_timeout).context("Failed to create IP source")?;
    let provider = CloudflareProvider::new(config.api_token(), config.dry_run, config.http_timeout)
        .context("Failed to create Cloudflare provider")?;

    if provider.is_dry_run() {
        warn!("DRY-RUN mode: records are read but never written");
    }

    DdnsEngine::new(Box::new(ip_source), Box::new(provider), config)
        .context("Failed to create engine")
}

/// Pick the exit code for an error that ended the daemon
///
/// Fatal core errors (bad configuration) exit as `ConfigError`, everything
/// else as `RuntimeError`.
fn exit_code_for(err: &anyhow::Error) -> DdnsExitCode {
    match err.downcast_ref::<naddns_core::Error>() {
        Some(core) if core.is_fatal() => DdnsExitCode::ConfigError,
        _ => DdnsExitCode::RuntimeError,
    }
}

/// Log engine events at debug level until the channel closes
async fn report_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::CycleFailed { hostname, error } => {
                debug!("Cycle for {} failed, retrying next tick: {}", hostname, error);
            }
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// Resolve on the first SIGTERM or SIGINT
///
/// Resolves immediately if a handler can't be installed.
#[cfg(unix)]
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {}", e);
            return;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", received);
}

/// Resolve on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: CTRL-C"),
        Err(e) => error!("Failed to wait for CTRL-C: {}", e),
    }
}
