//! Interactive console
//!
//! Lets a user drive the application from a terminal, including acting as
//! a stand-in session manager: `save <dir>` and `save-quit <dir>` deliver
//! session events exactly like an external host would.

use crate::app::AppEvent;
use crate::session::{SessionEvent, SessionEventKind, SessionHost, SessionNotifier};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, info};

/// Client id used for events issued from the console
pub const CONSOLE_CLIENT_UUID: &str = "console";

const HELP: &str = "\
Commands:
  save <dir>        save the session into <dir>
  save-quit <dir>   save the session into <dir>, then quit
  presets           list known presets
  banks             list program banks
  controls          list controller mappings
  quit | exit       save and quit
  help              show this text";

/// Session host that prints replies to the terminal
#[derive(Debug, Default)]
pub struct ConsoleHost {
    replies: usize,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of replies sent so far
    pub fn replies(&self) -> usize {
        self.replies
    }
}

impl SessionHost for ConsoleHost {
    fn reply(&mut self, event: SessionEvent, command_line: &str) -> Result<()> {
        self.replies += 1;
        info!(
            "Session {:?} for {} acknowledged",
            event.kind, event.client_uuid
        );
        println!("restart with: {}", command_line);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(AppEvent),
    Help,
    Empty,
    Unknown(String),
}

/// Parse one console line
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let session = |kind| {
        if rest.is_empty() {
            return Command::Unknown(format!("{} needs a directory", word));
        }
        Command::Event(AppEvent::Session(SessionEvent {
            kind,
            session_dir: rest.to_string(),
            client_uuid: CONSOLE_CLIENT_UUID.to_string(),
        }))
    };

    match word {
        "" => Command::Empty,
        "save" => session(SessionEventKind::Save),
        "save-quit" => session(SessionEventKind::SaveAndQuit),
        "presets" => Command::Event(AppEvent::ListPresets),
        "banks" => Command::Event(AppEvent::ListBanks),
        "controls" => Command::Event(AppEvent::ListControls),
        "quit" | "exit" => Command::Event(AppEvent::Quit),
        "help" | "?" => Command::Help,
        other => Command::Unknown(format!("unknown command: {}", other)),
    }
}

/// Blocking read-eval loop; run it on its own thread.
///
/// Ends on `quit`, `save-quit`, end of input, or when the application is gone.
pub fn run_repl(notifier: SessionNotifier) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        let line = match rl.readline(&format!("{}> ", crate::APP_TITLE)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                notifier.send(AppEvent::Quit);
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let _ = rl.add_history_entry(line.as_str());

        match parse_command(&line) {
            Command::Event(event) => {
                let last = matches!(
                    &event,
                    AppEvent::Quit
                        | AppEvent::Session(SessionEvent {
                            kind: SessionEventKind::SaveAndQuit,
                            ..
                        })
                );
                if !notifier.send(event) {
                    debug!("Application loop gone, leaving console");
                    break;
                }
                if last {
                    break;
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Empty => {}
            Command::Unknown(msg) => println!("{} (try 'help')", msg),
        }
    }

    Ok(())
}
