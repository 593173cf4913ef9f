//! Port discovery against a fake device directory

use cncsend_communication::{
    list_ports, scan_device_dir, LineSettings, PortConnector, PortDescriptor, SystemPorts,
};
use cncsend_core::ConnectionError;
use std::fs::File;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

// Counts WARN and ERROR events
#[derive(Clone, Default)]
struct LoudEvents(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for LoudEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level == Level::WARN || level == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn test_scan_matches_prefixes_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["ttyUSB1", "ttyS0", "ttyACM0", "ttyUSB0", "cu.usbmodem1", "null"] {
        File::create(dir.path().join(name)).unwrap();
    }

    let ports = scan_device_dir(dir.path(), &["ttyUSB", "ttyACM"]);
    let expected: Vec<PortDescriptor> = ["ttyACM0", "ttyUSB0", "ttyUSB1"]
        .iter()
        .map(|name| PortDescriptor::new(dir.path().join(name).to_string_lossy().into_owned()))
        .collect();

    assert_eq!(ports, expected);
}

#[test]
fn test_scan_with_no_matches_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    File::create(dir.path().join("ttyS0")).unwrap();

    assert!(scan_device_dir(dir.path(), &["cu."]).is_empty());
}

#[test]
fn test_system_listing_does_not_fail() {
    // Whatever is attached, enumeration returns a list rather than an error
    let ports = list_ports();

    #[cfg(target_os = "linux")]
    {
        for port in &ports {
            assert!(port.as_str().starts_with("/dev/tty"));
        }
    }

    #[cfg(windows)]
    {
        for port in &ports {
            assert!(port.as_str().starts_with(r"\\.\"));
        }
    }

    let _ = ports;
}

#[test]
fn test_failed_opens_stay_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let port = PortDescriptor::new(dir.path().join("ttyUSB9").to_string_lossy().into_owned());
    let loud = LoudEvents::default();
    let subscriber = tracing_subscriber::registry().with(loud.clone());

    tracing::subscriber::with_default(subscriber, || {
        for _ in 0..5 {
            let result = SystemPorts.open(&port, &LineSettings::default());
            assert!(matches!(result, Err(ConnectionError::FailedToOpen { .. })));
        }
    });

    assert_eq!(loud.0.load(Ordering::SeqCst), 0);
}
