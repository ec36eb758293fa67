// src/io/serial/mod.rs
//
// Serial port driver for the tilt sensor.
//
// Features:
// - Line-oriented transport over the `serialport` crate
// - USB descriptor based discovery of candidate ports
// - Validation of explicitly configured port names

pub mod registry;
pub mod transport;

pub use registry::{
    list_serial_ports, PortSpecifier, SerialPortInfo, UsbPortRegistry, DEFAULT_DEVICE_NAMES,
};
pub use transport::{LineBuffer, SerialOpener, SerialTransport};
