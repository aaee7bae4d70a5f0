//! Interactive console input.
//!
//! Lines starting with `:` are manager commands; anything else is typed
//! into the server console.

use hearth_runtime::{ControllerClosed, ControllerHandle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::presentation::print_help;

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Start,
    Stop,
    Restart,
    Backup,
    Tunnel,
    Help,
    Quit,
    /// Forwarded to the server's stdin.
    Console(String),
    Unknown(String),
    Empty,
}

impl InputCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let Some(name) = trimmed.strip_prefix(':') else {
            return Self::Console(trimmed.to_string());
        };
        match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "restart" => Self::Restart,
            "backup" => Self::Backup,
            "tunnel" => Self::Tunnel,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(name.to_string()),
        }
    }
}

/// Whether input handling should continue after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Forward one command to the controller.
pub fn apply(command: InputCommand, handle: &ControllerHandle) -> Result<Flow, ControllerClosed> {
    match command {
        InputCommand::Start => handle.start()?,
        InputCommand::Stop => handle.stop()?,
        InputCommand::Restart => handle.restart()?,
        InputCommand::Backup => handle.run_backup_now()?,
        InputCommand::Tunnel => handle.toggle_tunnel()?,
        InputCommand::Console(text) => handle.send_command(text)?,
        InputCommand::Help => print_help(),
        InputCommand::Unknown(name) => {
            println!("Unknown command ':{name}' (type :help)");
        }
        InputCommand::Empty => {}
        InputCommand::Quit => {
            handle.shutdown()?;
            return Ok(Flow::Exit);
        }
    }
    Ok(Flow::Continue)
}

/// Read commands from `reader` until EOF, `:quit` or the controller closes.
///
/// EOF on the input does not stop the server.
pub async fn read_commands<R>(reader: R, handle: ControllerHandle)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match apply(InputCommand::parse(&line), &handle) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) | Err(_) => break,
            },
            Ok(None) => {
                debug!("Input closed");
                break;
            }
            Err(e) => {
                debug!(error = %e, "Input read failed");
                break;
            }
        }
    }
}

/// Spawn the stdin reader.
pub fn spawn_stdin_reader(handle: ControllerHandle) -> JoinHandle<()> {
    tokio::spawn(read_commands(BufReader::new(tokio::io::stdin()), handle))
}
