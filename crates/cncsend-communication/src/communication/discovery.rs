//! Port discovery state
//!
//! Holds the last enumerated port list and the operator's selected index.
//! The list is re-enumerated only while it is empty (or after an explicit
//! refresh request), and never more often than the refresh interval, since
//! enumeration can block on the device directory.

use crate::communication::serial::{PortConnector, PortDescriptor};
use std::time::{Duration, Instant};

/// Enumerated ports plus the operator's selection
#[derive(Debug, Clone)]
pub struct PortDirectory {
    ports: Vec<PortDescriptor>,
    selected: usize,
    refresh_interval: Duration,
    last_scan: Option<Instant>,
    refresh_requested: bool,
}

impl PortDirectory {
    /// Create an empty directory that rescans at most once per `refresh_interval`
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            ports: Vec::new(),
            selected: 0,
            refresh_interval,
            last_scan: None,
            refresh_requested: false,
        }
    }

    /// Re-enumerate if the list is empty (or a refresh was requested) and the
    /// refresh interval has elapsed. Returns true when a scan ran.
    pub fn refresh_if_due(&mut self, now: Instant, connector: &dyn PortConnector) -> bool {
        if !self.ports.is_empty() && !self.refresh_requested {
            return false;
        }

        let due = match self.last_scan {
            None => true,
            Some(last) => {
                self.refresh_requested || now.saturating_duration_since(last) >= self.refresh_interval
            }
        };
        if !due {
            return false;
        }

        self.ports = connector.list_ports();
        self.last_scan = Some(now);
        self.refresh_requested = false;
        tracing::debug!("Enumerated {} serial port(s)", self.ports.len());
        true
    }

    /// Force a rescan on the next [`refresh_if_due`](Self::refresh_if_due)
    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Reset a selection that no longer points into the list
    pub fn clamp_selection(&mut self) {
        if self.selected >= self.ports.len() && self.selected != 0 {
            tracing::debug!(
                "Port index {} out of range ({} ports), resetting to 0",
                self.selected,
                self.ports.len()
            );
            self.selected = 0;
        }
    }

    /// Select a port by index. Out-of-range values are clamped on the next tick.
    pub fn select(&mut self, index: usize) {
        self.selected = index;
    }

    /// The selected index
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The selected port, if the index points into the list
    pub fn selected(&self) -> Option<&PortDescriptor> {
        self.ports.get(self.selected)
    }

    /// The last enumerated ports
    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    /// Forget the enumerated ports and selection
    pub fn clear(&mut self) {
        self.ports.clear();
        self.selected = 0;
        self.last_scan = None;
        self.refresh_requested = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::serial::SerialLink;
    use crate::communication::LineSettings;
    use cncsend_core::ConnectionError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConnector {
        ports: Vec<&'static str>,
        scans: AtomicUsize,
    }

    impl PortConnector for CountingConnector {
        fn list_ports(&self) -> Vec<PortDescriptor> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.ports.iter().map(|p| PortDescriptor::from(*p)).collect()
        }

        fn open(
            &self,
            port: &PortDescriptor,
            _settings: &LineSettings,
        ) -> Result<Box<dyn SerialLink>, ConnectionError> {
            Err(ConnectionError::FailedToOpen {
                port: port.to_string(),
                reason: "not supported".to_string(),
            })
        }
    }

    #[test]
    fn test_empty_list_rescans_after_interval() {
        let connector = CountingConnector {
            ports: Vec::new(),
            scans: AtomicUsize::new(0),
        };
        let mut dir = PortDirectory::new(Duration::from_millis(500));
        let start = Instant::now();

        assert!(dir.refresh_if_due(start, &connector));
        assert!(!dir.refresh_if_due(start + Duration::from_millis(100), &connector));
        assert!(dir.refresh_if_due(start + Duration::from_millis(500), &connector));
        assert_eq!(connector.scans.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_populated_list_is_kept() {
        let connector = CountingConnector {
            ports: vec!["/dev/ttyUSB0"],
            scans: AtomicUsize::new(0),
        };
        let mut dir = PortDirectory::new(Duration::from_millis(10));
        let start = Instant::now();

        dir.refresh_if_due(start, &connector);
        assert!(!dir.refresh_if_due(start + Duration::from_secs(5), &connector));
        assert_eq!(dir.ports().len(), 1);

        dir.request_refresh();
        assert!(dir.refresh_if_due(start + Duration::from_secs(5), &connector));
        assert_eq!(connector.scans.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clamp_selection() {
        let connector = CountingConnector {
            ports: vec!["a", "b", "c"],
            scans: AtomicUsize::new(0),
        };
        let mut dir = PortDirectory::new(Duration::from_millis(10));
        dir.refresh_if_due(Instant::now(), &connector);

        dir.select(2);
        dir.clamp_selection();
        assert_eq!(dir.selected_index(), 2);
        assert_eq!(dir.selected().map(|p| p.as_str()), Some("c"));

        dir.select(3);
        dir.clamp_selection();
        assert_eq!(dir.selected_index(), 0);
    }
}
