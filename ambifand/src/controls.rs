//! Interactive control commands
//!
//! Commands are read one per line from stdin and forwarded to the main loop
//! over an mpsc channel:
//!
//! ```text
//! connect [PORT]      open PORT, or the first port that opens
//! disconnect          close the port and switch to fallback values
//! ports               list serial ports
//! set FIELD FRACTION  set a fallback fraction (0.0 - 1.0)
//! status              show connection status and the last raw line
//! help                list commands
//! quit                shut down
//! ```

use std::io::{self, BufRead};
use std::str::FromStr;
use std::thread::{self, JoinHandle};

use ambifan_core::SensorField;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Help text shown by the `help` command
pub const HELP: &str = "Commands: connect [PORT] | disconnect | ports | \
set <temperature|humidity|gas> <0.0-1.0> | status | help | quit";

/// Command parse errors
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}'")]
    Unknown(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid field '{0}' (expected temperature, humidity or gas)")]
    InvalidField(String),

    #[error("Invalid fraction '{0}' (expected a number between 0.0 and 1.0)")]
    InvalidFraction(String),
}

/// One control request
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Connect to the given port, or scan when `None`
    Connect(Option<String>),
    Disconnect,
    ListPorts,
    /// Set one fallback fraction
    Set(SensorField, f32),
    Status,
    Help,
    Quit,
}

impl FromStr for ControlCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(command) = words.next() else {
            return Err(CommandError::Empty);
        };

        match command.to_lowercase().as_str() {
            "connect" | "c" => Ok(ControlCommand::Connect(words.next().map(str::to_string))),
            "disconnect" | "d" => Ok(ControlCommand::Disconnect),
            "ports" | "p" => Ok(ControlCommand::ListPorts),
            "set" | "s" => {
                let field = words
                    .next()
                    .ok_or(CommandError::MissingArgument("field"))?;
                let field = field
                    .parse::<SensorField>()
                    .map_err(|_| CommandError::InvalidField(field.to_string()))?;
                let value = words
                    .next()
                    .ok_or(CommandError::MissingArgument("fraction"))?;
                let fraction = value
                    .parse::<f32>()
                    .ok()
                    .filter(|f| (0.0..=1.0).contains(f))
                    .ok_or_else(|| CommandError::InvalidFraction(value.to_string()))?;
                Ok(ControlCommand::Set(field, fraction))
            }
            "status" => Ok(ControlCommand::Status),
            "help" | "?" => Ok(ControlCommand::Help),
            "quit" | "exit" | "q" => Ok(ControlCommand::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Read commands from stdin on a dedicated thread until EOF or until the
/// receiver goes away.
///
/// A plain thread is used so a pending read never holds up runtime shutdown.
/// Invalid commands are reported through `tracing` and skipped.
pub fn spawn_stdin_reader(tx: mpsc::Sender<ControlCommand>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("ambifan-controls".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to read control input: {}", e);
                        return;
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<ControlCommand>() {
                    Ok(command) => {
                        if tx.blocking_send(command).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("{}. {}", e, HELP),
                }
            }
            debug!("stdin closed, control input stopped");
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect() {
        assert_eq!(
            "connect".parse::<ControlCommand>().unwrap(),
            ControlCommand::Connect(None)
        );
        assert_eq!(
            "connect /dev/ttyUSB0".parse::<ControlCommand>().unwrap(),
            ControlCommand::Connect(Some("/dev/ttyUSB0".to_string()))
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(
            "disconnect".parse::<ControlCommand>().unwrap(),
            ControlCommand::Disconnect
        );
        assert_eq!(
            "PORTS".parse::<ControlCommand>().unwrap(),
            ControlCommand::ListPorts
        );
        assert_eq!(
            "  status  ".parse::<ControlCommand>().unwrap(),
            ControlCommand::Status
        );
        assert_eq!("q".parse::<ControlCommand>().unwrap(), ControlCommand::Quit);
        assert_eq!("help".parse::<ControlCommand>().unwrap(), ControlCommand::Help);
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            "set temperature 0.5".parse::<ControlCommand>().unwrap(),
            ControlCommand::Set(SensorField::Temperature, 0.5)
        );
        assert_eq!(
            "s gas 1".parse::<ControlCommand>().unwrap(),
            ControlCommand::Set(SensorField::Gas, 1.0)
        );
    }

    #[test]
    fn test_parse_set_errors() {
        assert_eq!(
            "set".parse::<ControlCommand>(),
            Err(CommandError::MissingArgument("field"))
        );
        assert_eq!(
            "set humidity".parse::<ControlCommand>(),
            Err(CommandError::MissingArgument("fraction"))
        );
        assert_eq!(
            "set pressure 0.5".parse::<ControlCommand>(),
            Err(CommandError::InvalidField("pressure".to_string()))
        );
        assert_eq!(
            "set humidity 1.5".parse::<ControlCommand>(),
            Err(CommandError::InvalidFraction("1.5".to_string()))
        );
        assert_eq!(
            "set humidity abc".parse::<ControlCommand>(),
            Err(CommandError::InvalidFraction("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_and_empty() {
        assert_eq!("".parse::<ControlCommand>(), Err(CommandError::Empty));
        assert_eq!(
            "reboot".parse::<ControlCommand>(),
            Err(CommandError::Unknown("reboot".to_string()))
        );
    }
}
