// src/io/serial/registry.rs
//
// Discovery of candidate serial ports and validation of explicit port names.

use serde::Serialize;

use crate::io::{LinkError, PortRegistry};

// ============================================================================
// Constants
// ============================================================================

/// USB descriptor substrings that identify the sensor board.
/// More names can be added for clones that report a different product string.
pub const DEFAULT_DEVICE_NAMES: &[&str] = &["Arduino", "USB Serial Device"];

/// Accepted port name prefixes and the lowest number each one allows.
const PORT_PREFIXES: &[(&str, u32)] = &[("COM", 1), ("/dev/ttyACM", 0), ("/dev/ttyUSB", 0)];

// ============================================================================
// Port Specifier
// ============================================================================

/// Which port(s) the handshake should try.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortSpecifier {
    /// Scan every port the registry reports.
    Auto,
    /// Use exactly this port.
    Explicit(String),
}

impl PortSpecifier {
    /// Parse a configured port value.
    ///
    /// An empty value selects automatic discovery. Anything else must be one of
    /// the known prefixes followed by an integer, e.g. `COM3` or `/dev/ttyACM0`.
    /// A malformed value is an error, never a silent fallback to scanning.
    pub fn parse(value: &str) -> Result<Self, LinkError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(PortSpecifier::Auto);
        }

        for (prefix, min) in PORT_PREFIXES {
            let Some(digits) = value.strip_prefix(prefix) else {
                continue;
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(LinkError::malformed_port(
                    value,
                    format!("expected an integer after '{}'", prefix),
                ));
            }
            let number: u32 = digits.parse().map_err(|_| {
                LinkError::malformed_port(value, format!("port number after '{}' is too large", prefix))
            })?;
            if number < *min {
                return Err(LinkError::malformed_port(
                    value,
                    format!("port number must be at least {}", min),
                ));
            }
            return Ok(PortSpecifier::Explicit(value.to_string()));
        }

        let accepted: Vec<String> = PORT_PREFIXES.iter().map(|(p, _)| format!("{}X", p)).collect();
        Err(LinkError::malformed_port(
            value,
            format!(
                "port name must follow the syntax {} where X is an integer, or be empty",
                accepted.join(", ")
            ),
        ))
    }
}

// ============================================================================
// USB Port Registry
// ============================================================================

/// Information about an available serial port
#[derive(Clone, Debug, Serialize)]
pub struct SerialPortInfo {
    pub port_name: String,
    pub port_type: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    /// Whether the descriptor matches one of the configured device names
    pub is_candidate: bool,
}

impl SerialPortInfo {
    /// One line for listings: candidates are marked with `*`.
    pub fn summary(&self) -> String {
        format!(
            "{} {:<30} {:<9} {} {}",
            if self.is_candidate { "*" } else { " " },
            self.port_name,
            self.port_type,
            self.manufacturer.as_deref().unwrap_or("-"),
            self.product.as_deref().unwrap_or("-"),
        )
    }
}

/// Lists attached USB serial ports whose descriptor names the sensor board.
#[derive(Clone, Debug)]
pub struct UsbPortRegistry {
    device_names: Vec<String>,
}

impl UsbPortRegistry {
    pub fn new(device_names: Vec<String>) -> Self {
        Self { device_names }
    }
}

impl PortRegistry for UsbPortRegistry {
    fn candidates(&self) -> Result<Vec<String>, LinkError> {
        Ok(list_serial_ports(&self.device_names)?
            .into_iter()
            .filter(|p| p.is_candidate)
            .map(|p| p.port_name)
            .collect())
    }
}

/// True when either descriptor string contains one of `names`.
fn descriptor_matches(names: &[String], manufacturer: Option<&str>, product: Option<&str>) -> bool {
    names.iter().any(|name| {
        product.is_some_and(|p| p.contains(name.as_str()))
            || manufacturer.is_some_and(|m| m.contains(name.as_str()))
    })
}

/// List available serial ports, flagging the ones that look like the sensor.
///
/// On macOS, filters out /dev/tty.* devices and only shows /dev/cu.* devices.
/// The tty devices block on open waiting for carrier detect.
pub fn list_serial_ports(device_names: &[String]) -> Result<Vec<SerialPortInfo>, LinkError> {
    let ports =
        serialport::available_ports().map_err(|e| LinkError::Enumeration(e.to_string()))?;

    Ok(ports
        .into_iter()
        .filter(|_p| {
            #[cfg(target_os = "macos")]
            {
                !_p.port_name.starts_with("/dev/tty.")
            }
            #[cfg(not(target_os = "macos"))]
            {
                true
            }
        })
        .map(|p| {
            let (port_type, manufacturer, product, vid, pid) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    "USB".to_string(),
                    info.manufacturer,
                    info.product,
                    Some(info.vid),
                    Some(info.pid),
                ),
                serialport::SerialPortType::BluetoothPort => {
                    ("Bluetooth".to_string(), None, None, None, None)
                }
                serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None, None),
                serialport::SerialPortType::Unknown => {
                    ("Unknown".to_string(), None, None, None, None)
                }
            };
            let is_candidate =
                descriptor_matches(device_names, manufacturer.as_deref(), product.as_deref());
            SerialPortInfo {
                port_name: p.port_name,
                port_type,
                manufacturer,
                product,
                vid,
                pid,
                is_candidate,
            }
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
