//! Operator console on stdin.
//!
//! Accepts `set-distance <meters>` (or `/set-distance`) to replace the
//! maximum distance while the monitor is running, and `distance` to show the
//! current value.

use stash_monitor::ThresholdWriter;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    SetDistance(Option<String>),
    ShowDistance,
    Help,
    Unknown(String),
}

/// Parses one console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_lowercase();

    let parsed = match command.trim_start_matches('/') {
        "set-distance" => ConsoleCommand::SetDistance(words.next().map(str::to_string)),
        "distance" => ConsoleCommand::ShowDistance,
        "help" => ConsoleCommand::Help,
        _ => ConsoleCommand::Unknown(command),
    };
    Some(parsed)
}

/// Executes a command and returns the reply for the operator.
pub fn execute(command: ConsoleCommand, threshold: &ThresholdWriter) -> Result<String, String> {
    match command {
        ConsoleCommand::SetDistance(Some(value)) => threshold
            .set_from_str(&value)
            .map(|_| format!("The maximum distance has been updated to {}m.", threshold.current()))
            .map_err(|e| format!("Please provide a valid numeric value for the distance ({}).", e)),
        ConsoleCommand::SetDistance(None) => {
            Err("Usage: set-distance <meters>".to_string())
        }
        ConsoleCommand::ShowDistance => {
            Ok(format!("The maximum distance is {}m.", threshold.current()))
        }
        ConsoleCommand::Help => Ok("Commands: set-distance <meters>, distance, help".to_string()),
        ConsoleCommand::Unknown(command) => Err(format!("Unknown command '{}'", command)),
    }
}

/// Reads commands until the input closes.
pub async fn run_console<R>(input: R, threshold: ThresholdWriter)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("⌨️ Console input failed: {}", e);
                break;
            }
        };

        let Some(command) = parse_command(&line) else {
            continue;
        };
        match execute(command, &threshold) {
            Ok(reply) => info!("⌨️ {}", reply),
            Err(reply) => warn!("⌨️ {}", reply),
        }
    }
    info!("⌨️ Console closed; maximum distance stays at {}m", threshold.current());
}
