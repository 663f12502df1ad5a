// src/device.rs
//
// Serial device boundary. The monitor only sees `Connector`/`DeviceLink`, so
// the state machine can be driven by a fake device in tests.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::error::DeviceError;

/// Where and how to open the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct PortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

/// An open device. Dropping it closes the handle.
pub trait DeviceLink {
    /// Everything the driver has buffered right now. Empty when nothing is
    /// pending; `Err` only for a real failure (cable pulled, port gone).
    fn drain(&mut self) -> Result<Vec<u8>, DeviceError>;
}

pub trait Connector {
    type Link: DeviceLink;

    /// Open the device and discard stale input.
    fn open(&mut self, config: &PortConfig) -> Result<Self::Link, DeviceError>;
}

// ---------------- serialport implementation ----------------

#[derive(Debug, Default)]
pub struct SerialConnector;

pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.port.name())
            .finish()
    }
}

impl Connector for SerialConnector {
    type Link = SerialLink;

    fn open(&mut self, config: &PortConfig) -> Result<SerialLink, DeviceError> {
        let port = serialport::new(&config.port_name, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| DeviceError::Open {
                port: config.port_name.clone(),
                source,
            })?;

        port.clear(ClearBuffer::Input)
            .map_err(|source| DeviceError::Flush {
                port: config.port_name.clone(),
                source,
            })?;

        Ok(SerialLink { port })
    }
}

impl DeviceLink for SerialLink {
    fn drain(&mut self) -> Result<Vec<u8>, DeviceError> {
        let waiting = self
            .port
            .bytes_to_read()
            .map_err(|e| DeviceError::Read(e.into()))? as usize;
        if waiting == 0 {
            return Ok(Vec::new());
        }

        let mut out = vec![0u8; waiting];
        let mut filled = 0;
        while filled < out.len() {
            match self.port.read(&mut out[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DeviceError::Read(e)),
            }
        }
        out.truncate(filled);
        Ok(out)
    }
}

// ---------------- Port dropdown item ----------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub port_name: String, // e.g. "COM5" or "/dev/ttyUSB0"
    pub display: String,   // e.g. "COM5: FTDI FT232R USB UART"
}

impl std::fmt::Display for PortEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display)
    }
}

pub fn scan_ports() -> Vec<PortEntry> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            log::warn!("port scan failed: {e}");
            return Vec::new();
        }
    };

    let mut out: Vec<PortEntry> = ports
        .into_iter()
        .map(|p| {
            let display = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => {
                    let parts: Vec<String> =
                        info.manufacturer.into_iter().chain(info.product).collect();
                    if parts.is_empty() {
                        format!("{}: USB Serial", p.port_name)
                    } else {
                        format!("{}: {}", p.port_name, parts.join(" "))
                    }
                }
                serialport::SerialPortType::BluetoothPort => {
                    format!("{}: Bluetooth", p.port_name)
                }
                serialport::SerialPortType::PciPort => format!("{}: PCI", p.port_name),
                serialport::SerialPortType::Unknown => p.port_name.clone(),
            };
            PortEntry {
                port_name: p.port_name,
                display,
            }
        })
        .collect();

    out.sort_by(|a, b| a.display.cmp(&b.display));
    out
}
