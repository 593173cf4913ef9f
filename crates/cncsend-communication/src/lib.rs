//! # CNCSend Communication
//!
//! Serial port discovery, the connection lifecycle, and the streaming engine
//! that sends one G-code line at a time and waits for the firmware's
//! completion token before sending the next.

pub mod communication;
pub mod files;
pub mod streaming;

pub use communication::{
    connection::{ConnectionManager, ReconcileOutcome},
    discovery::PortDirectory,
    serial::{
        extended_device_path, list_ports, scan_device_dir, PortConnector, PortDescriptor,
        RealSerialPort, SerialLink, SystemPorts,
    },
    LineSettings,
};
pub use files::{LineSource, Lines, ProjectFiles};
pub use streaming::{
    classifier::{ResponseClass, ResponseClassifier},
    engine::{EngineConfig, EngineHandle, EngineIntent, StreamingEngine, TransferProgress},
    queue::{Command, CommandQueue},
    scheduler::{Clock, ManualClock, SystemClock, Tick, TickScheduler},
    sentinel::Sentinel,
};
