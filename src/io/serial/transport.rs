// src/io/serial/transport.rs
//
// Line-oriented transport over a serial port.

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use crate::io::{LinkError, PortOpener, Transport, BAUD_RATE, READ_TIMEOUT};

// ============================================================================
// Line Buffer
// ============================================================================

/// Accumulates raw bytes and hands out complete lines.
///
/// Bytes after the last newline stay buffered until the rest of the line
/// arrives, so a line split across two reads is never cut in half.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Pop the next complete line, without its `\n` or `\r\n` terminator.
    pub fn take_line(&mut self) -> Option<String> {
        let newline = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// Serial Transport
// ============================================================================

/// A `Transport` backed by a real serial port.
pub struct SerialTransport {
    port_id: String,
    port: Box<dyn SerialPort>,
    lines: LineBuffer,
    read_timeout: Duration,
}

impl SerialTransport {
    /// Open `port_id` with the firmware's fixed parameters (9600 8N1, no flow control).
    pub fn open(port_id: &str) -> Result<Self, LinkError> {
        let mut port = serialport::new(port_id, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| LinkError::connection(port_id, e.to_string()))?;

        // Stale bytes from a previous session would be mistaken for fresh ones
        if let Err(e) = port.clear(ClearBuffer::All) {
            tlog!("[serial] Failed to clear buffers on {}: {}", port_id, e);
        }

        tlog!(
            "[serial] Opened {} at {} baud (8-N-1, flow control: none)",
            port_id,
            BAUD_RATE
        );

        Ok(Self {
            port_id: port_id.to_string(),
            port,
            lines: LineBuffer::new(),
            read_timeout: READ_TIMEOUT,
        })
    }
}

impl Transport for SerialTransport {
    fn port_id(&self) -> &str {
        &self.port_id
    }

    fn read_line(&mut self) -> Result<Option<String>, LinkError> {
        if let Some(line) = self.lines.take_line() {
            return Ok(Some(line));
        }

        let deadline = Instant::now() + self.read_timeout;
        let mut buf = [0u8; 128];

        while Instant::now() < deadline {
            match self.port.read(&mut buf) {
                Ok(0) => {
                    return Err(LinkError::read(&self.port_id, "port closed"));
                }
                Ok(n) => {
                    self.lines.push(&buf[..n]);
                    if let Some(line) = self.lines.take_line() {
                        return Ok(Some(line));
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(LinkError::read(&self.port_id, e.to_string())),
            }
        }

        Ok(None)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.port
            .write_all(bytes)
            .and_then(|_| self.port.flush())
            .map_err(|e| LinkError::write(&self.port_id, e.to_string()))
    }

    fn reset_input(&mut self) -> Result<(), LinkError> {
        self.lines.clear();
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| LinkError::write(&self.port_id, e.to_string()))
    }

    fn reset_output(&mut self) -> Result<(), LinkError> {
        self.port
            .clear(ClearBuffer::Output)
            .map_err(|e| LinkError::write(&self.port_id, e.to_string()))
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        tlog!("[serial] Closed {}", self.port_id);
    }
}

/// Opens `SerialTransport`s.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialOpener;

impl PortOpener for SerialOpener {
    fn open(&self, port: &str) -> Result<Box<dyn Transport>, LinkError> {
        Ok(Box::new(SerialTransport::open(port)?))
    }
}

// ============================================================================
// Tests
// ============================================================================
