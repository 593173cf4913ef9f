//! Serial port implementation
//!
//! Provides port enumeration and the link abstraction the streaming engine
//! reads and writes through. The real link wraps the `serialport` crate;
//! tests substitute their own [`PortConnector`].

use crate::communication::LineSettings;
use cncsend_core::ConnectionError;
use std::io::{self, Read, Write};
use std::path::Path;

/// Device name prefixes for CNC controllers under `/dev`
#[cfg(target_os = "macos")]
pub const DEVICE_PREFIXES: &[&str] = &["cu."];

/// Device name prefixes for CNC controllers under `/dev`
#[cfg(all(unix, not(target_os = "macos")))]
pub const DEVICE_PREFIXES: &[&str] = &["ttyUSB", "ttyACM"];

/// Prefix of the Windows extended-length device path form
const EXTENDED_PATH_PREFIX: &str = r"\\.\";

/// Platform identifier for a candidate serial device
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortDescriptor(String);

impl PortDescriptor {
    /// Wrap a device identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identifier as captured at enumeration
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortDescriptor {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An open, readable and writable serial connection
///
/// Reads must honour a bounded timeout and report it as
/// [`io::ErrorKind::TimedOut`] (or `WouldBlock`) rather than block.
pub trait SerialLink: Send {
    /// Write the whole buffer to the line
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever is available, up to `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// The port this link was opened on
    fn name(&self) -> &str;

    /// Release the underlying handle
    fn close(&mut self) {}
}

/// Source of ports and links
pub trait PortConnector: Send {
    /// Enumerate candidate ports. An empty list is not an error.
    fn list_ports(&self) -> Vec<PortDescriptor>;

    /// Open `port` with the given line settings
    fn open(
        &self,
        port: &PortDescriptor,
        settings: &LineSettings,
    ) -> Result<Box<dyn SerialLink>, ConnectionError>;
}

/// List available serial ports on the system
///
/// - Unix: device paths under `/dev` matching [`DEVICE_PREFIXES`]
/// - Windows: system port names in extended device path form (`\\.\COM3`)
pub fn list_ports() -> Vec<PortDescriptor> {
    #[cfg(unix)]
    {
        scan_device_dir(Path::new("/dev"), DEVICE_PREFIXES)
    }

    #[cfg(windows)]
    {
        match serialport::available_ports() {
            Ok(ports) => ports
                .into_iter()
                .map(|port| PortDescriptor::new(extended_device_path(&port.port_name)))
                .collect(),
            Err(e) => {
                tracing::debug!("Failed to enumerate serial ports: {}", e);
                Vec::new()
            }
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        Vec::new()
    }
}

/// Collect the entries of `dir` whose file name starts with one of
/// `prefixes`, as full paths in sorted order
pub fn scan_device_dir(dir: &Path, prefixes: &[&str]) -> Vec<PortDescriptor> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Failed to scan {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut ports: Vec<PortDescriptor> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            prefixes.iter().any(|prefix| name.starts_with(prefix))
        })
        .map(|entry| PortDescriptor::new(entry.path().to_string_lossy().into_owned()))
        .collect();

    ports.sort();
    ports
}

/// Convert a system port name to the extended device path form
pub fn extended_device_path(name: &str) -> String {
    if name.starts_with(EXTENDED_PATH_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", EXTENDED_PATH_PREFIX, name)
    }
}

/// Real serial port implementation using serialport crate
pub struct RealSerialPort {
    name: String,
    port: Box<dyn serialport::SerialPort>,
}

impl RealSerialPort {
    /// Open a serial port with the fixed line parameters
    ///
    /// Either the port comes back open with DTR and RTS asserted, or no port
    /// comes back at all.
    pub fn open(
        port: &PortDescriptor,
        settings: &LineSettings,
    ) -> Result<Self, ConnectionError> {
        let path = port
            .as_str()
            .strip_prefix(EXTENDED_PATH_PREFIX)
            .unwrap_or(port.as_str());

        let data_bits = match settings.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            _ => serialport::DataBits::Eight,
        };
        let stop_bits = match settings.stop_bits {
            2 => serialport::StopBits::Two,
            _ => serialport::StopBits::One,
        };

        let mut handle = serialport::new(path, settings.baud_rate)
            .data_bits(data_bits)
            .parity(serialport::Parity::None)
            .stop_bits(stop_bits)
            .flow_control(serialport::FlowControl::None)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| ConnectionError::FailedToOpen {
                port: port.to_string(),
                reason: e.to_string(),
            })?;

        let control = |e: serialport::Error| ConnectionError::ControlLines {
            port: port.to_string(),
            reason: e.to_string(),
        };
        handle
            .write_data_terminal_ready(settings.dtr)
            .map_err(control)?;
        handle.write_request_to_send(settings.rts).map_err(control)?;

        Ok(Self {
            name: port.to_string(),
            port: handle,
        })
    }
}

impl SerialLink for RealSerialPort {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        let _ = self.port.flush();
    }
}

/// Connector backed by the operating system's serial devices
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPorts;

impl PortConnector for SystemPorts {
    fn list_ports(&self) -> Vec<PortDescriptor> {
        list_ports()
    }

    fn open(
        &self,
        port: &PortDescriptor,
        settings: &LineSettings,
    ) -> Result<Box<dyn SerialLink>, ConnectionError> {
        Ok(Box::new(RealSerialPort::open(port, settings)?))
    }
}
