//! Streaming engine
//!
//! Tick-driven state machine that streams queued commands over the open
//! connection, one at a time:
//!
//! - **Idle**: nothing in flight. If the queue has a command, it is
//!   dequeued, framed with `\r\n` and written; the engine becomes Dispatched.
//! - **Dispatched**: exactly one command in flight. Inbound bytes accumulate
//!   until the sentinel shows up, then the reply goes to the classifier and
//!   the engine is Idle again.
//!
//! Every tick drains all inbound bytes regardless of state, so a command
//! dispatched and acknowledged within the same tick completes in one tick.
//! Operator intents arrive as [`EngineIntent`] messages through an
//! [`EngineHandle`] and are applied at the start of the next tick.
//!
//! A command whose write fails never reached the device, so it goes back to
//! the head of the queue and is sent first after the reconnect.

use crate::communication::connection::{ConnectionManager, ReconcileOutcome};
use crate::communication::discovery::PortDirectory;
use crate::communication::serial::{PortConnector, PortDescriptor};
use crate::communication::LineSettings;
use crate::files::LineSource;
use crate::streaming::classifier::ResponseClassifier;
use crate::streaming::queue::{Command, CommandQueue};
use crate::streaming::scheduler::{Clock, SystemClock, Tick};
use crate::streaming::sentinel::Sentinel;
use cncsend_core::{ConnectionError, MessageLevel, MessageSink, StreamError, TracingSink};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Read chunk size
const READ_CHUNK: usize = 256;

/// Upper bound on bytes drained in one tick, so a chatty device cannot
/// stall the tick
const MAX_READ_PER_TICK: usize = 16 * 1024;

/// Default port re-enumeration interval in milliseconds
pub const DEFAULT_PORT_REFRESH_MS: u64 = 500;

/// Operator intent, consumed once by the next tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineIntent {
    /// Want the connection open
    Open,
    /// Want the connection closed
    Close,
    /// Select a port by index into the enumerated list
    SelectPort(usize),
    /// Queue one command
    SendCommand(String),
    /// Queue every line of a file under the project root
    SendFile(String),
    /// Re-enumerate ports on the next tick
    RefreshPorts,
    /// Drop pending commands (the in-flight one still completes)
    ClearQueue,
    /// Emit ports and progress to the message sink
    ReportStatus,
    /// Close, forget ports, and clear all streaming state
    Reset,
}

/// Cloneable sender of [`EngineIntent`]s
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineIntent>,
}

impl EngineHandle {
    /// Send an intent. Returns false if the engine is gone.
    pub fn send(&self, intent: EngineIntent) -> bool {
        self.tx.send(intent).is_ok()
    }

    /// Request the connection open
    pub fn open_port(&self) -> bool {
        self.send(EngineIntent::Open)
    }

    /// Request the connection closed
    pub fn close_port(&self) -> bool {
        self.send(EngineIntent::Close)
    }

    /// Select a port by index
    pub fn select_port(&self, index: usize) -> bool {
        self.send(EngineIntent::SelectPort(index))
    }

    /// Queue one command
    pub fn send_command(&self, command: impl Into<String>) -> bool {
        self.send(EngineIntent::SendCommand(command.into()))
    }

    /// Queue a file's lines
    pub fn send_file(&self, filename: impl Into<String>) -> bool {
        self.send(EngineIntent::SendFile(filename.into()))
    }
}

/// Engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Line parameters for open
    pub line: LineSettings,
    /// Minimum time between enumerations while the port list is empty
    pub port_refresh_interval: Duration,
    /// Completion token
    pub sentinel: Sentinel,
    /// Response routing
    pub classifier: ResponseClassifier,
    /// Queue capacity, `None` for unbounded
    pub max_queue_len: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            line: LineSettings::default(),
            port_refresh_interval: Duration::from_millis(DEFAULT_PORT_REFRESH_MS),
            sentinel: Sentinel::default(),
            classifier: ResponseClassifier::default(),
            max_queue_len: None,
        }
    }
}

/// Snapshot of transfer progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferProgress {
    /// Commands waiting in the queue
    pub queued: usize,
    /// Whether a command is awaiting its sentinel
    pub in_flight: bool,
    /// Commands written since start
    pub dispatched: u64,
    /// Commands acknowledged since start
    pub acknowledged: u64,
    /// Commands written but dropped unacknowledged by a reopen, a lost
    /// connection or a reset
    pub abandoned: u64,
}

impl std::fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "queued {}, in flight {}, sent {}, acknowledged {}, abandoned {}",
            self.queued,
            u8::from(self.in_flight),
            self.dispatched,
            self.acknowledged,
            self.abandoned
        )
    }
}

/// The streaming engine
pub struct StreamingEngine {
    connection: ConnectionManager,
    ports: PortDirectory,
    queue: CommandQueue,
    in_flight: Option<Command>,
    received: String,
    sentinel: Sentinel,
    classifier: ResponseClassifier,
    files: Box<dyn LineSource>,
    sink: Box<dyn MessageSink>,
    clock: Box<dyn Clock>,
    intents_tx: mpsc::UnboundedSender<EngineIntent>,
    intents_rx: mpsc::UnboundedReceiver<EngineIntent>,
    dispatched: u64,
    acknowledged: u64,
    abandoned: u64,
    last_open_error: Option<ConnectionError>,
}

impl StreamingEngine {
    /// Create an engine. Output goes to `tracing` and time comes from the
    /// system clock until replaced.
    pub fn new(
        config: EngineConfig,
        connector: Box<dyn PortConnector>,
        files: Box<dyn LineSource>,
    ) -> Self {
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let queue = match config.max_queue_len {
            Some(capacity) => CommandQueue::with_capacity_limit(capacity),
            None => CommandQueue::new(),
        };

        Self {
            connection: ConnectionManager::new(connector, config.line),
            ports: PortDirectory::new(config.port_refresh_interval),
            queue,
            in_flight: None,
            received: String::new(),
            sentinel: config.sentinel,
            classifier: config.classifier,
            files,
            sink: Box::new(TracingSink),
            clock: Box::new(SystemClock),
            intents_tx,
            intents_rx,
            dispatched: 0,
            acknowledged: 0,
            abandoned: 0,
            last_open_error: None,
        }
    }

    /// Route operator-facing output to `sink`
    pub fn with_sink(mut self, sink: impl MessageSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Take time from `clock`
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// A handle for sending intents
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            tx: self.intents_tx.clone(),
        }
    }

    /// True while a command is dispatched and not yet acknowledged
    pub fn busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The command awaiting its sentinel
    pub fn in_flight(&self) -> Option<&Command> {
        self.in_flight.as_ref()
    }

    /// Bytes received since the last completion or dispatch
    pub fn received(&self) -> &str {
        &self.received
    }

    /// Pending commands
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Last enumerated ports
    pub fn ports(&self) -> &[PortDescriptor] {
        self.ports.ports()
    }

    /// Selected port index
    pub fn selected_port_index(&self) -> usize {
        self.ports.selected_index()
    }

    /// Whether the connection is open
    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Whether the operator wants the connection open
    pub fn desired_open(&self) -> bool {
        self.connection.desired_open()
    }

    /// The port of the open connection
    pub fn connected_port(&self) -> Option<&PortDescriptor> {
        self.connection.port()
    }

    /// Progress counters
    pub fn progress(&self) -> TransferProgress {
        TransferProgress {
            queued: self.queue.len(),
            in_flight: self.busy(),
            dispatched: self.dispatched,
            acknowledged: self.acknowledged,
            abandoned: self.abandoned,
        }
    }

    /// Want the connection open from the next tick on
    pub fn request_open(&mut self) {
        self.connection.set_desired_open(true);
    }

    /// Want the connection closed from the next tick on
    pub fn request_close(&mut self) {
        self.connection.set_desired_open(false);
        self.last_open_error = None;
    }

    /// Select a port by index
    pub fn select_port(&mut self, index: usize) {
        self.ports.select(index);
    }

    /// Queue one command at the tail
    pub fn enqueue_command(&mut self, text: impl Into<String>) -> Result<(), StreamError> {
        self.enqueue(Command::new(text))
    }

    /// Queue every line of `filename` in order
    ///
    /// A read failure stops the load; lines queued before it stay queued.
    /// Returns how many lines were queued.
    pub fn load_file(&mut self, filename: &str) -> Result<usize, StreamError> {
        let lines = match self.files.open_lines(filename) {
            Ok(lines) => lines,
            Err(e) => return Err(self.file_failed(filename, e)),
        };

        let mut count = 0;
        for line in lines {
            match line {
                Ok(text) => {
                    self.enqueue(Command::new(text))?;
                    count += 1;
                }
                Err(e) => return Err(self.file_failed(filename, e)),
            }
        }

        self.sink.emit(
            MessageLevel::Info,
            &format!("Queued {} line(s) from {}", count, self.files.describe(filename)),
        );
        Ok(count)
    }

    /// Close the connection, drop the open intent, forget ports, and clear
    /// the queue, reply buffer and in-flight command
    pub fn reset(&mut self) {
        self.connection.set_desired_open(false);
        self.connection.close();
        self.ports.clear();
        self.queue.clear();
        self.received.clear();
        self.abandon_in_flight("reset");
        self.last_open_error = None;
    }

    fn apply(&mut self, intent: EngineIntent) {
        tracing::debug!("Applying intent {:?}", intent);
        match intent {
            EngineIntent::Open => self.request_open(),
            EngineIntent::Close => self.request_close(),
            EngineIntent::SelectPort(index) => self.select_port(index),
            EngineIntent::SendCommand(text) => {
                let _ = self.enqueue_command(text);
            }
            EngineIntent::SendFile(filename) => {
                let _ = self.load_file(&filename);
            }
            EngineIntent::RefreshPorts => self.ports.request_refresh(),
            EngineIntent::ClearQueue => {
                let dropped = self.queue.clear();
                self.sink.emit(
                    MessageLevel::Info,
                    &format!("Cleared {} queued command(s)", dropped),
                );
            }
            EngineIntent::ReportStatus => self.report_status(),
            EngineIntent::Reset => self.reset(),
        }
    }

    fn drain_intents(&mut self) {
        while let Ok(intent) = self.intents_rx.try_recv() {
            self.apply(intent);
        }
    }

    fn enqueue(&mut self, command: Command) -> Result<(), StreamError> {
        self.queue.enqueue(command).inspect_err(|e| {
            self.sink.emit(MessageLevel::Warning, &e.to_string());
        })
    }

    fn file_failed(&mut self, filename: &str, e: io::Error) -> StreamError {
        let err = StreamError::FileRead {
            path: self.files.describe(filename),
            reason: e.to_string(),
        };
        self.sink.emit(MessageLevel::Error, &err.to_string());
        err
    }

    fn report_status(&mut self) {
        let ports = if self.ports.ports().is_empty() {
            "none".to_string()
        } else {
            self.ports
                .ports()
                .iter()
                .enumerate()
                .map(|(i, port)| format!("[{}] {}", i, port))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let connection = match self.connection.port() {
            Some(port) => format!("open on {}", port),
            None if self.connection.desired_open() => "opening".to_string(),
            None => "closed".to_string(),
        };
        let message = format!(
            "Ports: {} | selected {} | connection {} | {}",
            ports,
            self.ports.selected_index(),
            connection,
            self.progress()
        );
        self.sink.emit(MessageLevel::Info, &message);
    }

    fn reconcile_connection(&mut self) {
        let outcome = self.connection.reconcile(
            self.ports.selected(),
            self.ports.selected_index(),
            self.ports.ports().len(),
        );

        match outcome {
            ReconcileOutcome::Unchanged => {}
            ReconcileOutcome::Opened(port) => {
                self.last_open_error = None;
                self.received.clear();
                self.abandon_in_flight("reopen");
                self.sink
                    .emit(MessageLevel::Info, &format!("Ready for input on {}", port));
            }
            ReconcileOutcome::Closed => {
                self.sink.emit(MessageLevel::Info, "Port closed");
            }
            ReconcileOutcome::OpenFailed(err) => {
                if self.last_open_error.as_ref() == Some(&err) {
                    tracing::debug!("Open retry failed: {}", err);
                } else {
                    self.sink.emit(MessageLevel::Error, &err.to_string());
                    self.last_open_error = Some(err);
                }
            }
        }
    }

    fn dispatch_next(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let Some(link) = self.connection.link_mut() else {
            return;
        };
        let Some(command) = self.queue.dequeue() else {
            return;
        };

        self.received.clear();
        match link.write_all(&command.frame()) {
            Ok(()) => {
                tracing::debug!("Sent: {}", command.text());
                self.dispatched += 1;
                self.in_flight = Some(command);
            }
            Err(e) => {
                tracing::warn!("Write failed, requeued: {}", command.text());
                self.queue.requeue_front(command);
                self.connection_lost(format!("write failed: {}", e));
            }
        }
    }

    fn accumulate_inbound(&mut self) {
        let mut buf = [0u8; READ_CHUNK];
        let mut total = 0;

        while total < MAX_READ_PER_TICK {
            let Some(link) = self.connection.link_mut() else {
                return;
            };
            match link.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    self.received.extend(buf[..n].iter().copied().map(char::from));
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) =>
                {
                    break
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.connection_lost(format!("read failed: {}", e));
                    break;
                }
            }
        }
    }

    fn complete_if_acknowledged(&mut self) {
        if !self.sentinel.matches(&self.received) {
            return;
        }

        let response = std::mem::take(&mut self.received);
        self.classifier.report(&response, self.sink.as_mut());

        match self.in_flight.take() {
            Some(command) => {
                self.acknowledged += 1;
                tracing::debug!("Acknowledged: {}", command.text());
            }
            None => tracing::debug!("Sentinel received with no command in flight"),
        }
    }

    fn connection_lost(&mut self, reason: String) {
        let err = ConnectionError::ConnectionLost { reason };
        self.sink.emit(MessageLevel::Error, &err.to_string());
        self.abandon_in_flight("connection lost");
        self.connection.close();
    }

    fn abandon_in_flight(&mut self, cause: &str) {
        if let Some(command) = self.in_flight.take() {
            self.abandoned += 1;
            tracing::warn!("Abandoned in-flight command ({}): {}", cause, command.text());
        }
    }
}

impl Tick for StreamingEngine {
    fn tick(&mut self) {
        self.drain_intents();

        let now = self.clock.now();
        self.ports.refresh_if_due(now, self.connection.connector());
        self.ports.clamp_selection();
        self.reconcile_connection();

        if !self.connection.is_open() {
            return;
        }

        self.dispatch_next();
        self.accumulate_inbound();
        self.complete_if_acknowledged();
    }
}
