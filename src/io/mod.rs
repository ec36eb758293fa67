// src/io/mod.rs
//
// Transport layer for the tilt sensor link.
//
// The session logic never touches the serial port directly. It talks to a
// `Transport` obtained from a `PortOpener`, and learns which ports exist from
// a `PortRegistry`. The serial driver provides the real implementations.

mod error;
pub mod serial;

use std::time::Duration;

pub use error::LinkError;

// ============================================================================
// Wire Protocol Constants
// ============================================================================
// These must match the firmware byte-for-byte.

/// Sent by the device when it wants (re)provisioning.
pub const READY_MESSAGE: &str = "Ready";
/// Sent by the host right after a Ready marker is seen.
pub const CONFIRMATION_MESSAGE: &str = "Confirmation";
/// Watchdog pulse sent by the host while the device is provisioned.
pub const CONNECTED_MESSAGE: &str = "Connected";
/// Banner the firmware prints after boot, before its first Ready.
pub const RESET_MESSAGE: &str = "Reset";

pub const COMMAND_START: char = '<';
pub const COMMAND_END: char = '>';

/// Fixed serial parameters of the firmware.
pub const BAUD_RATE: u32 = 9600;
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Traits
// ============================================================================

/// A line-oriented byte connection to one device.
///
/// Dropping a transport closes it.
pub trait Transport: Send {
    /// Identifier of the endpoint, e.g. `COM3` or `/dev/ttyACM0`.
    fn port_id(&self) -> &str;

    /// Read one line, waiting at most the per-call timeout.
    /// Returns `Ok(None)` when nothing arrived. Line terminators are stripped.
    fn read_line(&mut self) -> Result<Option<String>, LinkError>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// Discard any bytes received but not yet read.
    fn reset_input(&mut self) -> Result<(), LinkError>;

    /// Discard any bytes queued but not yet sent.
    fn reset_output(&mut self) -> Result<(), LinkError>;

    /// Write `line` followed by a newline.
    fn write_line(&mut self, line: &str) -> Result<(), LinkError> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        self.write_all(&bytes)
    }
}

/// Opens transports by port identifier.
pub trait PortOpener: Send + Sync {
    fn open(&self, port: &str) -> Result<Box<dyn Transport>, LinkError>;
}

/// Lists the currently attached ports that look like the sensor.
pub trait PortRegistry: Send + Sync {
    fn candidates(&self) -> Result<Vec<String>, LinkError>;
}

// ============================================================================
// Retry and Timing Policy
// ============================================================================

/// How many retries are allowed after the first attempt. `None` waits forever.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryLimit(pub Option<u32>);

impl RetryLimit {
    pub const UNBOUNDED: RetryLimit = RetryLimit(None);

    pub fn bounded(retries: u32) -> Self {
        RetryLimit(Some(retries))
    }

    /// True once `retries` failed retries exceed the ceiling.
    pub fn exceeded(&self, retries: u32) -> bool {
        match self.0 {
            Some(max) => retries > max,
            None => false,
        }
    }
}

impl std::fmt::Display for RetryLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(max) => write!(f, "{}", max),
            None => write!(f, "unbounded"),
        }
    }
}

/// Every delay used by the session loops.
#[derive(Clone, Debug)]
pub struct Timings {
    /// Pause between two full discovery passes.
    pub reconnect_interval: Duration,
    /// Pause between two health-monitor ticks. Also the command loop's idle wait.
    pub poll_interval: Duration,
    /// Settle delay before and after each monitor reconnection attempt.
    pub reconnect_settle: Duration,
    /// Grace period for the device to react to a Confirmation.
    pub ready_settle: Duration,
    /// Back-off after a failed read in the command loop.
    pub read_error_backoff: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            reconnect_settle: Duration::from_secs(2),
            ready_settle: Duration::from_millis(300),
            read_error_backoff: Duration::from_millis(100),
        }
    }
}

impl Timings {
    /// No delays at all. Used by tests driving the loops step by step.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            reconnect_interval: Duration::ZERO,
            poll_interval: Duration::ZERO,
            reconnect_settle: Duration::ZERO,
            ready_settle: Duration::ZERO,
            read_error_backoff: Duration::ZERO,
        }
    }
}

/// Sleep unless the duration is zero.
pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
