// src/session/monitor.rs
//
// Background health monitor.
//
// Each tick:
// 1. Scan the registry for candidate ports.
// 2. If the session port is gone: clear both flags and drop the transport.
// 3. If disconnected and candidates exist: try to open each one in turn with a
//    settle delay around every attempt. A full failed pass counts against the
//    retry ceiling.
// 4. If connected and the command channel is not reading: read one line. A
//    Ready marker means the device wants its parameters again.
// 5. Otherwise, once parameters were sent, send the Connected watchdog pulse.
//
// The device repeats Ready whenever it needs configuration (e.g. after its
// own reset), which is why the monitor tracks "parameters sent" separately
// from "connected".

use std::sync::Arc;

use crate::io::{
    pause, LinkError, PortOpener, PortRegistry, RetryLimit, Timings, CONFIRMATION_MESSAGE,
    CONNECTED_MESSAGE, READY_MESSAGE, RESET_MESSAGE,
};
use crate::settings::ConfigProvider;

use super::{provision, SessionCoordinator};

/// What a single tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Connected and nothing to do (command channel is reading, parameters not yet sent).
    Idle,
    /// No transport and no candidate ports to try.
    Disconnected,
    /// Every candidate refused to open this tick.
    ReconnectFailed,
    /// A Ready marker was answered and parameters were sent.
    Provisioned,
    /// The watchdog pulse was sent.
    KeepAlive,
}

pub struct HealthMonitor {
    coordinator: Arc<SessionCoordinator>,
    opener: Arc<dyn PortOpener>,
    registry: Arc<dyn PortRegistry>,
    config: Arc<dyn ConfigProvider>,
    limit: RetryLimit,
    timings: Timings,
    failed_passes: u32,
}

impl HealthMonitor {
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        opener: Arc<dyn PortOpener>,
        registry: Arc<dyn PortRegistry>,
        config: Arc<dyn ConfigProvider>,
        limit: RetryLimit,
        timings: Timings,
    ) -> Self {
        Self {
            coordinator,
            opener,
            registry,
            config,
            limit,
            timings,
            failed_passes: 0,
        }
    }

    /// Poll forever. Only returns when reconnection exhausts a finite ceiling.
    pub fn run(mut self) -> LinkError {
        tlog!(
            "[monitor] Watching {} (retry limit: {})",
            self.coordinator.port_id(),
            self.limit
        );
        loop {
            if let Err(e) = self.tick() {
                tlog!("[monitor] {}", e);
                return e;
            }
            pause(self.timings.poll_interval);
        }
    }

    /// One polling step.
    pub fn tick(&mut self) -> Result<TickOutcome, LinkError> {
        let candidates = match self.registry.candidates() {
            Ok(candidates) => candidates,
            Err(e) => {
                // Treat a failed scan as "no news" rather than as an unplug
                tlog!("[monitor] {}", e);
                return Ok(TickOutcome::Idle);
            }
        };

        let port_id = self.coordinator.port_id();
        if self.coordinator.is_connected() && !candidates.contains(&port_id) {
            tlog!("[monitor] {}", LinkError::LinkLost(port_id));
            self.coordinator.config_sent().clear();
            self.coordinator.receiving().clear();
            self.coordinator.invalidate();
        }

        if !self.coordinator.is_connected() {
            if candidates.is_empty() {
                return Ok(TickOutcome::Disconnected);
            }
            if !self.reconnect(&candidates) {
                self.failed_passes = self.failed_passes.saturating_add(1);
                if self.limit.exceeded(self.failed_passes) {
                    return Err(LinkError::timeout(format!(
                        "could not reopen any of {} after {} attempts",
                        candidates.join(", "),
                        self.failed_passes
                    )));
                }
                return Ok(TickOutcome::ReconnectFailed);
            }
        }

        if !self.coordinator.receiving().is_set() {
            match self.coordinator.with_transport(|t| t.read_line()) {
                Some(Ok(Some(line))) if line.contains(READY_MESSAGE) => {
                    self.reprovision();
                    return Ok(TickOutcome::Provisioned);
                }
                Some(Ok(Some(line))) if line.contains(RESET_MESSAGE) => {
                    tlog!("[monitor] Device on {} reports a reset", self.coordinator.port_id());
                }
                Some(Ok(Some(line))) if !line.is_empty() => {
                    tlog!("[monitor] Ignoring '{}'", line);
                }
                // The port scan at the start of the next tick decides whether this was an unplug
                Some(Err(e)) => tlog!("[monitor] {}", e),
                _ => {}
            }
        }

        if self.coordinator.config_sent().is_set() {
            let sent = self.coordinator.with_transport(|t| {
                if let Err(e) = t.reset_output() {
                    tlog!("[monitor] {}", e);
                }
                t.write_line(CONNECTED_MESSAGE)
            });
            // Same as above: a failed pulse is left for the next port scan
            if let Some(Err(e)) = sent {
                tlog!("[monitor] Watchdog pulse not sent: {}", e);
            }
            return Ok(TickOutcome::KeepAlive);
        }

        Ok(TickOutcome::Idle)
    }

    /// Try each candidate once. Adopts the first one that opens.
    fn reconnect(&mut self, candidates: &[String]) -> bool {
        for port in candidates {
            pause(self.timings.reconnect_settle);
            tlog!("[monitor] Attempting serial connection to {}...", port);
            match self.opener.open(port) {
                Ok(transport) => {
                    let epoch = self.coordinator.swap_transport(transport);
                    self.coordinator.receiving().clear();
                    self.failed_passes = 0;
                    tlog!("[monitor] Reconnected on {} (epoch {})", port, epoch);
                    return true;
                }
                Err(e) => {
                    tlog!("[monitor] {}", e);
                    pause(self.timings.reconnect_settle);
                }
            }
        }
        false
    }

    /// Answer a Ready marker: confirm, reload configuration, resend parameters.
    fn reprovision(&self) {
        let port = self.coordinator.port_id();
        tlog!("[monitor] Ready message received on {}", port);
        self.coordinator.receiving().set();

        // An unplug racing this write is expected; the next port scan handles it
        if let Some(Err(e)) = self
            .coordinator
            .with_transport(|t| t.write_line(CONFIRMATION_MESSAGE))
        {
            tlog!("[monitor] Confirmation not sent: {}", e);
        }

        // Re-reading here lets the operator change settings by replugging the board
        match self.config.load() {
            Ok(snapshot) => self.coordinator.replace_snapshot(Arc::new(snapshot)),
            Err(e) => tlog!("[monitor] Keeping previous configuration: {}", e),
        }

        pause(self.timings.ready_settle);
        let snapshot = self.coordinator.snapshot();
        self.coordinator
            .with_transport(|t| provision(t, &snapshot));
        self.coordinator.config_sent().set();
    }
}

// ============================================================================
// Tests
// ============================================================================
