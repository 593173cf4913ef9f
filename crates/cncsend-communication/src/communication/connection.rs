//! Connection manager
//!
//! Owns at most one open [`SerialLink`]. The operator expresses intent as a
//! desired open/closed state; [`ConnectionManager::reconcile`] runs once per
//! tick and opens or closes to close the gap. Failed opens leave the intent
//! set, so the next tick retries.

use crate::communication::serial::{PortConnector, PortDescriptor, SerialLink};
use crate::communication::LineSettings;
use cncsend_core::ConnectionError;

/// What a reconcile pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Actual state already matched the intent
    Unchanged,
    /// A link was opened on the named port
    Opened(PortDescriptor),
    /// The open link was closed
    Closed,
    /// Opening was attempted and failed; intent is kept for retry
    OpenFailed(ConnectionError),
}

/// Single-connection lifecycle manager
pub struct ConnectionManager {
    connector: Box<dyn PortConnector>,
    settings: LineSettings,
    link: Option<Box<dyn SerialLink>>,
    port: Option<PortDescriptor>,
    desired_open: bool,
}

impl ConnectionManager {
    /// Create a manager with no open link and no open intent
    pub fn new(connector: Box<dyn PortConnector>, settings: LineSettings) -> Self {
        Self {
            connector,
            settings,
            link: None,
            port: None,
            desired_open: false,
        }
    }

    /// The connector used for enumeration and opening
    pub fn connector(&self) -> &dyn PortConnector {
        self.connector.as_ref()
    }

    /// Line parameters applied on open
    pub fn settings(&self) -> &LineSettings {
        &self.settings
    }

    /// Set the desired state
    pub fn set_desired_open(&mut self, open: bool) {
        self.desired_open = open;
    }

    /// The desired state
    pub fn desired_open(&self) -> bool {
        self.desired_open
    }

    /// Whether a link is open
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// The port of the open link
    pub fn port(&self) -> Option<&PortDescriptor> {
        self.port.as_ref()
    }

    /// Mutable access to the open link
    pub fn link_mut(&mut self) -> Option<&mut (dyn SerialLink + 'static)> {
        self.link.as_deref_mut()
    }

    /// Compare intent with reality and act on the difference
    ///
    /// `selected` is the port to open if an open is needed; `available` is
    /// the size of the enumerated list, used only for error reporting.
    pub fn reconcile(
        &mut self,
        selected: Option<&PortDescriptor>,
        selected_index: usize,
        available: usize,
    ) -> ReconcileOutcome {
        match (self.desired_open, self.link.is_some()) {
            (true, false) => {
                let Some(port) = selected else {
                    return ReconcileOutcome::OpenFailed(ConnectionError::PortUnavailable {
                        index: selected_index,
                        available,
                    });
                };
                match self.open(port) {
                    Ok(()) => ReconcileOutcome::Opened(port.clone()),
                    Err(e) => ReconcileOutcome::OpenFailed(e),
                }
            }
            (false, true) => {
                self.close();
                ReconcileOutcome::Closed
            }
            _ => ReconcileOutcome::Unchanged,
        }
    }

    /// Open `port`. Callers only open when no link exists.
    pub fn open(&mut self, port: &PortDescriptor) -> Result<(), ConnectionError> {
        let link = self.connector.open(port, &self.settings)?;
        tracing::info!("Opened {} at {} baud", port, self.settings.baud_rate);
        self.link = Some(link);
        self.port = Some(port.clone());
        Ok(())
    }

    /// Release the link if there is one. Without a link this does nothing.
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            tracing::info!("Closing {}", link.name());
            link.close();
        }
        self.port = None;
    }
}
