//! Operator console
//!
//! Reads operator lines from stdin and turns them into engine intents.

use crate::{EngineHandle, EngineIntent};
use std::io::BufRead;
use tokio::sync::mpsc;

/// One parsed operator line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the engine
    Intent(EngineIntent),
    /// Print the command summary
    Help,
    /// Leave the console
    Quit,
    /// Blank line
    Empty,
}

/// Parse failure, shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// First word is not a command
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    /// Command given without its argument
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    /// `port` argument is not a number
    #[error("invalid port index '{0}'")]
    InvalidIndex(String),
}

/// Command summary printed at startup and on `help`
pub const HELP: &str = "\
commands:
  open            open the selected port
  close           close the port
  ports           rescan serial ports
  port <n>        select port by index
  send <text>     queue one command
  file <name>     queue every line of a file
  clear           drop queued commands
  status          show ports and progress
  reset           close and clear everything
  quit            exit";

/// Parse one operator line
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleCommand::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let intent = match word.to_ascii_lowercase().as_str() {
        "open" => EngineIntent::Open,
        "close" => EngineIntent::Close,
        "ports" => EngineIntent::RefreshPorts,
        "port" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("port"));
            }
            let index = rest
                .parse()
                .map_err(|_| ParseError::InvalidIndex(rest.to_string()))?;
            EngineIntent::SelectPort(index)
        }
        "send" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("send"));
            }
            EngineIntent::SendCommand(rest.to_string())
        }
        "file" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("file"));
            }
            EngineIntent::SendFile(rest.to_string())
        }
        "clear" => EngineIntent::ClearQueue,
        "status" => EngineIntent::ReportStatus,
        "reset" => EngineIntent::Reset,
        "help" | "?" => return Ok(ConsoleCommand::Help),
        "quit" | "exit" => return Ok(ConsoleCommand::Quit),
        _ => return Err(ParseError::Unknown(word.to_string())),
    };

    Ok(ConsoleCommand::Intent(intent))
}

/// Read stdin lines on a dedicated thread
///
/// The runtime never waits on a pending read, so shutdown does not need a
/// keypress. The channel closes at EOF or on a read error; the thread ends
/// once the receiver is dropped and the next line arrives.
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!("Failed to start console reader: {}", e);
    }
    rx
}

/// Feed operator lines to the engine until the input closes, `quit`, or the
/// engine goes away
pub async fn run(mut lines: mpsc::UnboundedReceiver<String>, handle: EngineHandle) {
    while let Some(line) = lines.recv().await {
        match parse_line(&line) {
            Ok(ConsoleCommand::Intent(intent)) => {
                if !handle.send(intent) {
                    tracing::warn!("Engine stopped; leaving console");
                    break;
                }
            }
            Ok(ConsoleCommand::Help) => println!("{}", HELP),
            Ok(ConsoleCommand::Quit) => break,
            Ok(ConsoleCommand::Empty) => {}
            Err(e) => println!("{}", e),
        }
    }
}
