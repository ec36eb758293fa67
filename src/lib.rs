// src/lib.rs
//
// tiltlink: keeps a serial link to a USB tilt sensor and reorients a display
// whenever the sensor reports that a different edge points down.

#[macro_use]
mod logging;

pub mod display;
pub mod io;
pub mod orientation;
pub mod session;
pub mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::display::{DisplayController, ExternalDisplayProgram};
use crate::io::serial::{
    list_serial_ports, PortSpecifier, SerialOpener, SerialPortInfo, UsbPortRegistry,
    DEFAULT_DEVICE_NAMES,
};
use crate::io::{LinkError, RetryLimit, Timings};
use crate::session::{provision, CommandChannel, HandshakeEngine, HealthMonitor, SessionCoordinator};
use crate::settings::{ConfigError, ConfigProvider, ConfigSnapshot, ConfigSource};

pub use logging::{init_file_logging, stop_file_logging};

// ============================================================================
// Errors
// ============================================================================

/// Conditions that end the process.
#[derive(Debug, Error)]
pub enum Fatal {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    TaskEnded(String),
}

impl Fatal {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Fatal::Config(_) => 2,
            Fatal::Link(_) | Fatal::TaskEnded(_) => 1,
        }
    }
}

// ============================================================================
// Run
// ============================================================================

/// Command-line overrides for a controller run.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub config_path: PathBuf,
    /// Overrides the file's `mode`.
    pub mode: Option<String>,
    /// Overrides the mode's `serial_port`.
    pub port: Option<String>,
    /// Overrides `retry_limit` for both config loading and reconnection.
    pub retry_limit: Option<u32>,
    /// Overrides `log_dir`.
    pub log_dir: Option<PathBuf>,
}

/// Run the controller until a fatal error or Ctrl-C.
///
/// A fatal error is logged before it is returned.
pub async fn run(options: RunOptions) -> Result<(), Fatal> {
    let result = run_session(options).await;
    if let Err(e) = &result {
        tlog!("[setup] Fatal: {}", e);
    }
    result
}

/// Handshake, first provisioning, then both session loops.
///
/// The health monitor gets its own OS thread and is never joined, so it
/// cannot hold up shutdown. The command loop blocks a tokio blocking thread.
/// Both loops run forever, so callers should exit the process once this
/// returns instead of waiting for the runtime to drain.
async fn run_session(options: RunOptions) -> Result<(), Fatal> {
    if let Some(dir) = &options.log_dir {
        start_file_logging(dir);
    }

    let timings = Timings::default();
    let config_limit = options.retry_limit.map_or(RetryLimit::UNBOUNDED, RetryLimit::bounded);
    let source = ConfigSource::new(&options.config_path).with_mode(options.mode.clone());
    tlog!("[setup] Loading configuration from {}", source.path().display());
    let snapshot = load_blocking(source.clone(), config_limit, &timings).await?;

    if options.log_dir.is_none() {
        if let Some(dir) = &snapshot.log_dir {
            start_file_logging(dir);
        }
    }

    let display: Arc<dyn DisplayController> =
        Arc::new(ExternalDisplayProgram::new(snapshot.display_program.clone()));

    let (source, snapshot) =
        apply_monitor_limit(source, snapshot, &*display, config_limit, &timings).await?;
    tlog!("[setup] Using mode {}", snapshot.mode);

    let limit = options
        .retry_limit
        .map_or_else(|| snapshot.retry_limit(), RetryLimit::bounded);
    let ports = PortSpecifier::parse(options.port.as_deref().unwrap_or(&snapshot.serial_port))?;

    let registry = Arc::new(UsbPortRegistry::new(snapshot.device_names.clone()));
    let opener = Arc::new(SerialOpener);

    if ports == PortSpecifier::Auto {
        log_available_ports(&snapshot.device_names);
    }

    let engine = HandshakeEngine::new(opener.clone(), registry.clone(), limit, timings.clone());
    tlog!("[setup] Looking for the sensor ({:?}, retry limit: {})", ports, limit);
    let mut session = tokio::task::spawn_blocking(move || engine.establish(&ports))
        .await
        .map_err(|e| Fatal::TaskEnded(format!("Handshake task failed: {}", e)))??;

    let snapshot = Arc::new(snapshot);
    provision(session.transport.as_mut(), &snapshot);

    let coordinator = Arc::new(SessionCoordinator::new(session, snapshot));

    let monitor = HealthMonitor::new(
        coordinator.clone(),
        opener,
        registry,
        Arc::new(source),
        limit,
        timings.clone(),
    );
    let (fatal_tx, fatal_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("health-monitor".into())
        .spawn(move || {
            let _ = fatal_tx.send(monitor.run());
        })
        .map_err(|e| Fatal::TaskEnded(format!("Failed to start health monitor: {}", e)))?;

    let channel = CommandChannel::new(coordinator, display, timings);
    let command_task = tokio::task::spawn_blocking(move || channel.run());

    tokio::select! {
        result = fatal_rx => match result {
            Ok(e) => Err(Fatal::Link(e)),
            Err(_) => Err(Fatal::TaskEnded("Health monitor stopped unexpectedly".into())),
        },
        result = command_task => Err(Fatal::TaskEnded(match result {
            Ok(()) => "Command loop stopped unexpectedly".to_string(),
            Err(e) => format!("Command loop failed: {}", e),
        })),
        _ = tokio::signal::ctrl_c() => {
            tlog!("[setup] Interrupted, shutting down");
            Ok(())
        }
    }
}

/// Bound monitor ids by the controller's monitor count, reloading once to
/// validate against it.
///
/// `ExternalDisplayProgram` cannot count monitors, so with it this is a
/// no-op. Controllers that can enumerate displays get the upper bound check,
/// on this load and on every reload by the health monitor.
async fn apply_monitor_limit(
    source: ConfigSource,
    snapshot: ConfigSnapshot,
    display: &dyn DisplayController,
    limit: RetryLimit,
    timings: &Timings,
) -> Result<(ConfigSource, ConfigSnapshot), Fatal> {
    let Some(count) = display.monitor_count() else {
        return Ok((source, snapshot));
    };
    let source = source.with_monitor_limit(Some(count));
    let snapshot = load_blocking(source.clone(), limit, timings).await?;
    Ok((source, snapshot))
}

/// Log every port before scanning, so a board with an unexpected descriptor
/// can be spotted.
fn log_available_ports(device_names: &[String]) {
    match list_serial_ports(device_names) {
        Ok(ports) if ports.is_empty() => tlog!("[setup] No serial ports available"),
        Ok(ports) => {
            tlog!("[setup] Available serial ports (* = candidate):");
            for port in ports {
                tlog!("[setup]   {}", port.summary());
            }
        }
        Err(e) => tlog!("[setup] {}", e),
    }
}

fn start_file_logging(dir: &std::path::Path) {
    if let Err(e) = init_file_logging(dir) {
        tlog!("[setup] {}", e);
    }
}

async fn load_blocking(
    source: ConfigSource,
    limit: RetryLimit,
    timings: &Timings,
) -> Result<ConfigSnapshot, Fatal> {
    let interval = timings.reconnect_interval;
    tokio::task::spawn_blocking(move || source.load_with_retry(limit, interval))
        .await
        .map_err(|e| Fatal::TaskEnded(format!("Configuration task failed: {}", e)))?
        .map_err(Fatal::from)
}

// ============================================================================
// Utility Commands
// ============================================================================

/// All serial ports, with the ones the registry would try flagged.
///
/// Device names come from the configuration when it loads, otherwise the
/// built-in defaults are used.
pub fn list_ports(config_path: &std::path::Path) -> Result<Vec<SerialPortInfo>, Fatal> {
    let device_names = match ConfigSource::new(config_path).load() {
        Ok(snapshot) => snapshot.device_names,
        Err(e) => {
            tlog!("[list] {} (using default device names)", e);
            DEFAULT_DEVICE_NAMES.iter().map(|s| s.to_string()).collect()
        }
    };
    Ok(list_serial_ports(&device_names)?)
}

/// Load and validate a configuration once, returning it as pretty JSON.
pub fn check_config(config_path: &std::path::Path, mode: Option<String>) -> Result<String, Fatal> {
    let snapshot = ConfigSource::new(config_path).with_mode(mode).load()?;
    serde_json::to_string_pretty(&snapshot)
        .map_err(|e| Fatal::Config(ConfigError::Parse(e.to_string())))
}
