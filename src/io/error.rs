// src/io/error.rs
//
// Error taxonomy for the device link.

use thiserror::Error;

/// Errors raised while discovering, opening, or talking to the sensor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// No candidate port answered the handshake during discovery.
    #[error("No device found: {0}")]
    DeviceNotFound(String),

    /// A finite retry ceiling was exhausted.
    #[error("Serial connection timed out: {0}")]
    Timeout(String),

    /// The connected port disappeared from the candidate set.
    #[error("Link lost on {0}")]
    LinkLost(String),

    /// An explicitly configured port does not follow the accepted syntax.
    #[error("Malformed serial port '{value}': {reason}")]
    MalformedPortSpecifier { value: String, reason: String },

    /// The port opened but did not answer with the Ready marker.
    #[error("Handshake failed on {port}: {message}")]
    Handshake { port: String, message: String },

    #[error("Failed to open {port}: {message}")]
    Connection { port: String, message: String },

    #[error("Read error on {port}: {message}")]
    Read { port: String, message: String },

    #[error("Write error on {port}: {message}")]
    Write { port: String, message: String },

    /// Port enumeration failed.
    #[error("Failed to enumerate ports: {0}")]
    Enumeration(String),
}

impl LinkError {
    pub fn connection(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            port: port.into(),
            message: message.into(),
        }
    }

    pub fn handshake(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handshake {
            port: port.into(),
            message: message.into(),
        }
    }

    pub fn read(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            port: port.into(),
            message: message.into(),
        }
    }

    pub fn write(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            port: port.into(),
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn device_not_found(message: impl Into<String>) -> Self {
        Self::DeviceNotFound(message.into())
    }

    pub fn malformed_port(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPortSpecifier {
            value: value.into(),
            reason: reason.into(),
        }
    }
}
