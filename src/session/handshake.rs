// src/session/handshake.rs
//
// Ready/Confirmation handshake used to establish the first session.
//
// For each candidate port: open, read one line, and look for the Ready
// marker. On a match the host answers with Confirmation, drops whatever else
// is buffered, and keeps the transport. A full pass without a match is
// retried after `reconnect_interval`, up to the retry ceiling.

use std::sync::Arc;

use crate::io::serial::PortSpecifier;
use crate::io::{
    pause, LinkError, PortOpener, PortRegistry, RetryLimit, Timings, Transport,
    CONFIRMATION_MESSAGE, READY_MESSAGE,
};

use super::{DeviceSession, LinkState};

const ERROR_SERIAL_TIMEOUT: &str = "No connection was established. Possible solutions: \
check your wiring; restart the board before attempting a new connection; \
if a port was specified in the configuration file, double-check it";

pub struct HandshakeEngine {
    opener: Arc<dyn PortOpener>,
    registry: Arc<dyn PortRegistry>,
    limit: RetryLimit,
    timings: Timings,
}

impl HandshakeEngine {
    pub fn new(
        opener: Arc<dyn PortOpener>,
        registry: Arc<dyn PortRegistry>,
        limit: RetryLimit,
        timings: Timings,
    ) -> Self {
        Self {
            opener,
            registry,
            limit,
            timings,
        }
    }

    /// Find the device and complete the handshake.
    ///
    /// With an unbounded ceiling this blocks until hardware shows up.
    /// A finite ceiling fails with `DeviceNotFound` when no candidate port was
    /// ever seen, and with `Timeout` when candidates existed but none answered.
    pub fn establish(&self, ports: &PortSpecifier) -> Result<DeviceSession, LinkError> {
        let mut retries: u32 = 0;
        let mut saw_candidate = false;

        loop {
            let candidates = self.candidates(ports);
            if candidates.is_empty() {
                tlog!("[handshake] No device found, waiting for one to be plugged in");
            } else {
                saw_candidate = true;
            }

            for port in &candidates {
                match self.attempt(port) {
                    Ok(transport) => {
                        tlog!("[handshake] {}: {:?}", port, LinkState::Connected);
                        return Ok(DeviceSession {
                            port_id: port.clone(),
                            transport,
                        });
                    }
                    Err(e) => tlog!("[handshake] {}. Trying next available port", e),
                }
            }

            retries = retries.saturating_add(1);
            if self.limit.exceeded(retries) {
                return Err(if saw_candidate {
                    LinkError::timeout(ERROR_SERIAL_TIMEOUT)
                } else {
                    LinkError::device_not_found(format!(
                        "no matching port appeared after {} retries",
                        self.limit
                    ))
                });
            }
            pause(self.timings.reconnect_interval);
        }
    }

    fn candidates(&self, ports: &PortSpecifier) -> Vec<String> {
        match ports {
            PortSpecifier::Explicit(port) => vec![port.clone()],
            PortSpecifier::Auto => match self.registry.candidates() {
                Ok(candidates) => candidates,
                Err(e) => {
                    tlog!("[handshake] {}", e);
                    Vec::new()
                }
            },
        }
    }

    /// Probe a single port. The transport is closed on any failure.
    pub fn attempt(&self, port: &str) -> Result<Box<dyn Transport>, LinkError> {
        tlog!("[handshake] Attempting serial connection to {}...", port);
        let mut transport = self.opener.open(port)?;
        tlog!("[handshake] {}: {:?}", port, LinkState::Probing);

        tlog!("[handshake] {}: {:?}", port, LinkState::AwaitingReady);
        let line = transport.read_line()?.unwrap_or_default();
        // Give the device a moment before it has to listen for the answer
        pause(self.timings.ready_settle);

        if !line.contains(READY_MESSAGE) {
            return Err(LinkError::handshake(port, "Ready message was not received"));
        }

        tlog!("[handshake] Device found on {}", port);
        transport.write_line(CONFIRMATION_MESSAGE)?;
        transport.reset_input()?;
        tlog!("[handshake] {}: {:?}", port, LinkState::Confirmed);

        Ok(transport)
    }
}

// ============================================================================
// Tests
// ============================================================================
