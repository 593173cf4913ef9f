//! Console lines flowing into the engine as intents

use cncsend::{console, EngineConfig, StreamingEngine};
use cncsend_communication::{LineSettings, PortConnector, PortDescriptor, SerialLink, Tick};
use cncsend_core::ConnectionError;
use std::time::Duration;
use tokio::sync::mpsc;

struct NoPorts;

impl PortConnector for NoPorts {
    fn list_ports(&self) -> Vec<PortDescriptor> {
        Vec::new()
    }

    fn open(
        &self,
        port: &PortDescriptor,
        _settings: &LineSettings,
    ) -> Result<Box<dyn SerialLink>, ConnectionError> {
        Err(ConnectionError::FailedToOpen {
            port: port.to_string(),
            reason: "no hardware".to_string(),
        })
    }
}

fn engine() -> StreamingEngine {
    StreamingEngine::new(
        EngineConfig::default(),
        Box::new(NoPorts),
        Box::new(cncsend::ProjectFiles::new(".")),
    )
    .with_sink(|_: cncsend::MessageLevel, _: &str| {})
}

// Lines as if typed, followed by end of input
fn typed(lines: &[&str]) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    for line in lines {
        tx.send(line.to_string()).unwrap();
    }
    rx
}

#[tokio::test]
async fn test_console_queues_until_quit() {
    let mut engine = engine();
    let input = typed(&["send G0 X1", "", "bogus", "send G1 Y2", "open", "quit", "send never"]);

    console::run(input, engine.handle()).await;
    engine.tick();

    let queued: Vec<&str> = engine.queue().iter().map(|c| c.text()).collect();
    assert_eq!(queued, ["G0 X1", "G1 Y2"]);
    assert!(engine.desired_open());
    assert!(!engine.is_open());
}

#[tokio::test]
async fn test_console_stops_at_eof() {
    let mut engine = engine();
    let input = typed(&["send M3", "clear"]);

    console::run(input, engine.handle()).await;
    engine.tick();

    assert!(engine.queue().is_empty());
}

#[tokio::test]
async fn test_console_leaves_when_engine_dropped() {
    let handle = engine().handle();

    // Sends fail once the receiver is gone; the console exits cleanly
    console::run(typed(&["send G0", "send G1"]), handle).await;
}

#[tokio::test]
async fn test_idle_console_does_not_block_shutdown() {
    let engine = engine();
    let (_typing, input) = mpsc::unbounded_channel::<String>();

    let interrupted = tokio::select! {
        _ = console::run(input, engine.handle()) => false,
        _ = tokio::time::sleep(Duration::from_millis(20)) => true,
    };

    assert!(interrupted);
}

#[test]
fn test_file_command_reads_project_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("job.gcode"), "G21\nG90\nG0 X0\n").unwrap();

    let mut engine = StreamingEngine::new(
        EngineConfig::default(),
        Box::new(NoPorts),
        Box::new(cncsend::ProjectFiles::new(dir.path())),
    )
    .with_sink(|_: cncsend::MessageLevel, _: &str| {});

    let handle = engine.handle();
    match console::parse_line("file job.gcode").unwrap() {
        console::ConsoleCommand::Intent(intent) => assert!(handle.send(intent)),
        other => panic!("unexpected {:?}", other),
    }
    engine.tick();

    assert_eq!(engine.queue().len(), 3);
}
