//! Serial port transport implementation
//!
//! Provides the serial link to bench power supplies connected via USB or
//! RS-232.
//!
//! Supports:
//! - Port enumeration
//! - Baud rate configuration
//! - Parity and stop bit configuration
//! - Line-oriented command/query round-trips with read timeout

use crate::communication::{ConnectionParams, SerialParity, Transport};
use psukit_core::{Error, Result, TransportError};
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// Serial number if available
    pub serial_number: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set serial number
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List available serial ports on the system
///
/// Returns a list of available ports with information about each port.
/// Filters ports to include only likely instrument links:
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    match serialport::available_ports() {
        Ok(ports) => {
            let port_infos: Vec<SerialPortInfo> = ports
                .iter()
                .filter(|port| is_valid_instrument_port(&port.port_name))
                .map(|port| {
                    let info = SerialPortInfo::new(&port.port_name, get_port_description(port));

                    match &port.port_type {
                        serialport::SerialPortType::UsbPort(usb_info) => {
                            let mut info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                            if let Some(ref mfg) = usb_info.manufacturer {
                                info = info.with_manufacturer(mfg);
                            }
                            if let Some(ref serial) = usb_info.serial_number {
                                info = info.with_serial_number(serial);
                            }
                            info
                        }
                        _ => info,
                    }
                })
                .collect();

            Ok(port_infos)
        }
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Err(Error::other(format!("Failed to enumerate ports: {}", e)))
        }
    }
}

/// Check if a port name matches instrument link patterns
fn is_valid_instrument_port(port_name: &str) -> bool {
    // Windows COM ports
    if port_name.starts_with("COM") && port_name[3..].chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    // Linux USB and ACM devices
    if port_name.starts_with("/dev/ttyUSB") || port_name.starts_with("/dev/ttyACM") {
        return true;
    }

    // macOS serial and modem devices
    if port_name.starts_with("/dev/cu.usbserial-") || port_name.starts_with("/dev/cu.usbmodem") {
        return true;
    }

    false
}

/// Get a user-friendly description for a port
fn get_port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Convert a parity setting to serialport format
fn to_serialport_parity(parity: SerialParity) -> serialport::Parity {
    match parity {
        SerialParity::None => serialport::Parity::None,
        SerialParity::Even => serialport::Parity::Even,
        SerialParity::Odd => serialport::Parity::Odd,
    }
}

/// Serial transport using the serialport crate
///
/// Writes newline-terminated command lines and reads newline-terminated
/// replies. The instrument link cannot handle interleaved requests; callers
/// hold this behind one exclusive handle.
pub struct SerialTransport {
    port: Option<Box<dyn serialport::SerialPort>>,
    port_name: String,
    timeout_ms: u64,
}

impl SerialTransport {
    /// Open a serial transport with the given parameters
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        let builder = serialport::new(&params.port, params.baud_rate)
            // Short read timeout; query() loops until the full line or its own deadline
            .timeout(Duration::from_millis(10))
            .data_bits(match params.data_bits {
                5 => serialport::DataBits::Five,
                6 => serialport::DataBits::Six,
                7 => serialport::DataBits::Seven,
                8 => serialport::DataBits::Eight,
                _ => {
                    return Err(Error::other(format!(
                        "Invalid data bits: {}",
                        params.data_bits
                    )))
                }
            })
            .stop_bits(match params.stop_bits {
                1 => serialport::StopBits::One,
                2 => serialport::StopBits::Two,
                _ => {
                    return Err(Error::other(format!(
                        "Invalid stop bits: {}",
                        params.stop_bits
                    )))
                }
            })
            .parity(to_serialport_parity(params.parity))
            .flow_control(if params.flow_control {
                serialport::FlowControl::Hardware
            } else {
                serialport::FlowControl::None
            });

        match builder.open() {
            Ok(port) => Ok(Self {
                port: Some(port),
                port_name: params.port.clone(),
                timeout_ms: params.timeout_ms,
            }),
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                Err(TransportError::FailedToOpen {
                    port: params.port.clone(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| TransportError::NotConnected.into())
    }

    /// Read bytes until a newline arrives or the query deadline passes
    fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + Duration::from_millis(self.timeout_ms);
        let timeout_ms = self.timeout_ms;
        let port = self.port_mut()?;

        let mut line: Vec<u8> = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(1) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    line.push(byte[0]);
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    if Instant::now() >= deadline {
                        return Err(TransportError::Timeout { timeout_ms }.into());
                    }
                }
                Err(e) => {
                    return Err(TransportError::Io {
                        reason: e.to_string(),
                    }
                    .into())
                }
            }
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout { timeout_ms }.into());
            }
        }

        let reply = String::from_utf8_lossy(&line)
            .trim_end_matches('\r')
            .to_string();
        Ok(reply)
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, command: &str) -> Result<()> {
        tracing::debug!("-> {}", command);
        let port = self.port_mut()?;
        port.write_all(command.as_bytes())
            .and_then(|_| port.write_all(b"\n"))
            .and_then(|_| port.flush())
            .map_err(|e| {
                TransportError::Io {
                    reason: e.to_string(),
                }
                .into()
            })
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.send(command)?;
        let reply = self.read_line()?;
        tracing::debug!("<- {}", reply);
        Ok(reply)
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            tracing::debug!("Closed serial port {}", self.port_name);
        }
        Ok(())
    }
}
