//! Session manager save/restore
//!
//! An external session manager (e.g. JACK session) can ask the running
//! application to save its state into a session directory and tell the
//! manager how to relaunch it later. Handling an event:
//!
//! 1. derive a session name from the session directory,
//! 2. save the current preset as `<session name>.<title>` inside it,
//! 3. build the relaunch command line (`<exe> "${SESSION_DIR}<file>"`),
//! 4. reply to the host, which acknowledges and releases the event,
//! 5. ask the application to quit if the event was save-and-quit.
//!
//! The reply is sent even if saving the preset failed; a host that never
//! gets a reply stalls the whole session.
//!
//! Host callbacks arrive on a foreign thread. They must not touch
//! application state directly: [`SessionNotifier`] posts the event into the
//! application's event loop, where [`SessionHandler`] runs.

use crate::app::AppEvent;
use crate::preset::PresetWriter;
use anyhow::Result;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Placeholder the session host expands to the session directory at restart
pub const SESSION_DIR_TOKEN: &str = "${SESSION_DIR}";

/// What the host asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    Save,
    SaveAndQuit,
    /// Save as a reusable template (handled like a plain save)
    SaveTemplate,
}

/// Session request delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    /// Directory the host wants this client's state saved into
    pub session_dir: String,
    pub client_uuid: String,
}

/// The session manager connection
pub trait SessionHost {
    /// Hand `command_line` back for `event`, acknowledge it and release it
    fn reply(&mut self, event: SessionEvent, command_line: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    HandlingEvent,
}

/// What the application should do after an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Continue,
    Quit,
}

/// Handles session events on the application thread
#[derive(Debug)]
pub struct SessionHandler {
    title: String,
    executable: PathBuf,
    state: SessionState,
}

impl SessionHandler {
    pub fn new(title: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            executable: executable.into(),
            state: SessionState::Idle,
        }
    }

    /// Handler relaunching the running executable
    pub fn for_current_exe(title: impl Into<String>) -> Self {
        let executable = std::env::current_exe()
            .ok()
            .or_else(|| std::env::args_os().next().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(crate::APP_TITLE));
        Self::new(title, executable)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the save protocol for `event`; the host always gets a reply
    pub fn handle<W, H>(
        &mut self,
        event: SessionEvent,
        writer: &mut W,
        host: &mut H,
    ) -> SessionOutcome
    where
        W: PresetWriter + ?Sized,
        H: SessionHost + ?Sized,
    {
        self.state = SessionState::HandlingEvent;
        debug!(
            "Session event: kind={:?} client_uuid={:?} session_dir={:?}",
            event.kind, event.client_uuid, event.session_dir
        );

        let quit = event.kind == SessionEventKind::SaveAndQuit;

        let session_file = session_file_name(&session_name(&event.session_dir), &self.title);
        let preset_path = absolute(&Path::new(&event.session_dir).join(&session_file));

        if let Err(e) = writer.save_preset(&preset_path) {
            warn!(
                "Failed to save session preset {}: {:#}",
                preset_path.display(),
                e
            );
        }

        let command_line = command_line(&self.executable, &session_file);
        info!("Session reply command line: {}", command_line);

        if let Err(e) = host.reply(event, &command_line) {
            error!("Failed to reply to session host: {:#}", e);
        }

        self.state = SessionState::Idle;

        if quit {
            info!("Session save-and-quit requested");
            SessionOutcome::Quit
        } else {
            SessionOutcome::Continue
        }
    }
}

/// Session name for a host session directory.
///
/// Like a file-info "canonical path": with a trailing separator the directory
/// itself is used, otherwise its parent. The name is that directory's base
/// name without the last extension. Empty if nothing can be derived.
pub fn session_name(session_dir: &str) -> String {
    let dir = Path::new(session_dir);
    let base = if session_dir.ends_with('/') || session_dir.ends_with(MAIN_SEPARATOR) {
        dir.to_path_buf()
    } else {
        dir.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let canonical = std::fs::canonicalize(&base).unwrap_or_else(|e| {
        debug!("Cannot canonicalize {}: {}", base.display(), e);
        base.clone()
    });

    canonical
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<session name>.<title>`
pub fn session_file_name(session_name: &str, title: &str) -> String {
    format!("{}.{}", session_name, title)
}

/// Relaunch command: executable plus the quoted, host-expandable preset path
pub fn command_line(executable: &Path, session_file: &str) -> String {
    format!(
        "{} \"{}{}\"",
        executable.display(),
        SESSION_DIR_TOKEN,
        session_file
    )
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Thread-safe entry point for host callbacks.
///
/// Cheap to clone; `notify` never blocks and may be called from any thread.
#[derive(Clone)]
pub struct SessionNotifier {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl SessionNotifier {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Queue `event` for the application thread.
    ///
    /// Returns false when the application loop is gone.
    pub fn notify(&self, event: SessionEvent) -> bool {
        self.send(AppEvent::Session(event))
    }

    /// Queue any application event
    pub fn send(&self, event: AppEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingHost {
        replies: Vec<(SessionEvent, String)>,
        fail: bool,
    }

    impl SessionHost for RecordingHost {
        fn reply(&mut self, event: SessionEvent, command_line: &str) -> Result<()> {
            self.replies.push((event, command_line.to_string()));
            if self.fail {
                return Err(anyhow!("host went away"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        saved: Vec<PathBuf>,
        fail: bool,
    }

    impl PresetWriter for RecordingWriter {
        fn save_preset(&mut self, path: &Path) -> Result<()> {
            if self.fail {
                return Err(anyhow!("disk full"));
            }
            fs::write(path, "{}")?;
            self.saved.push(path.to_path_buf());
            Ok(())
        }
    }

    fn event(kind: SessionEventKind, dir: &str) -> SessionEvent {
        SessionEvent {
            kind,
            session_dir: dir.to_string(),
            client_uuid: "4711".to_string(),
        }
    }

    #[test]
    fn test_session_name_derivation() {
        let temp = tempdir().unwrap();
        let app_dir = temp.path().join("sess1").join("app");
        fs::create_dir_all(&app_dir).unwrap();

        let without_slash = app_dir.to_str().unwrap().to_string();
        assert_eq!(session_name(&without_slash), "sess1");

        let with_slash = format!("{}/", without_slash);
        assert_eq!(session_name(&with_slash), "app");
    }

    #[test]
    fn test_command_line_format() {
        let line = command_line(Path::new("/usr/bin/patchkeeper"), "sess1.patchkeeper");
        assert_eq!(
            line,
            "/usr/bin/patchkeeper \"${SESSION_DIR}sess1.patchkeeper\""
        );
    }

    #[test]
    fn test_save_and_quit_scenario() {
        let temp = tempdir().unwrap();
        let app_dir = temp.path().join("sess1").join("app");
        fs::create_dir_all(&app_dir).unwrap();
        let session_dir = app_dir.to_str().unwrap().to_string();

        let mut handler = SessionHandler::new("patchkeeper", "/usr/bin/patchkeeper");
        let mut writer = RecordingWriter::default();
        let mut host = RecordingHost::default();

        let outcome = handler.handle(
            event(SessionEventKind::SaveAndQuit, &session_dir),
            &mut writer,
            &mut host,
        );

        assert_eq!(outcome, SessionOutcome::Quit);
        assert_eq!(handler.state(), SessionState::Idle);

        assert_eq!(writer.saved, vec![app_dir.join("sess1.patchkeeper")]);
        assert!(app_dir.join("sess1.patchkeeper").exists());

        assert_eq!(host.replies.len(), 1);
        let (acked, line) = &host.replies[0];
        assert_eq!(acked.client_uuid, "4711");
        assert!(!line.is_empty());
        assert!(line.contains(SESSION_DIR_TOKEN));
        assert!(line.ends_with("sess1.patchkeeper\""));
    }

    #[test]
    fn test_plain_save_keeps_running() {
        let temp = tempdir().unwrap();
        let dir = format!("{}/", temp.path().display());

        let mut handler = SessionHandler::new("patchkeeper", "/bin/pk");
        let mut writer = RecordingWriter::default();
        let mut host = RecordingHost::default();

        for kind in [SessionEventKind::Save, SessionEventKind::SaveTemplate] {
            let outcome = handler.handle(event(kind, &dir), &mut writer, &mut host);
            assert_eq!(outcome, SessionOutcome::Continue);
        }
        assert_eq!(host.replies.len(), 2);
    }

    #[test]
    fn test_reply_sent_even_when_preset_save_fails() {
        let mut handler = SessionHandler::new("patchkeeper", "/bin/pk");
        let mut writer = RecordingWriter {
            fail: true,
            ..Default::default()
        };
        let mut host = RecordingHost::default();

        let outcome = handler.handle(
            event(SessionEventKind::SaveAndQuit, "/no/such/dir/app"),
            &mut writer,
            &mut host,
        );

        assert_eq!(outcome, SessionOutcome::Quit);
        assert_eq!(host.replies.len(), 1);
        assert!(host.replies[0].1.contains(SESSION_DIR_TOKEN));
    }

    #[test]
    fn test_host_reply_failure_is_not_fatal() {
        let temp = tempdir().unwrap();
        let dir = format!("{}/", temp.path().display());

        let mut handler = SessionHandler::new("patchkeeper", "/bin/pk");
        let mut writer = RecordingWriter::default();
        let mut host = RecordingHost {
            fail: true,
            ..Default::default()
        };

        let outcome = handler.handle(event(SessionEventKind::Save, &dir), &mut writer, &mut host);
        assert_eq!(outcome, SessionOutcome::Continue);
        assert_eq!(handler.state(), SessionState::Idle);
    }

    #[test]
    fn test_notifier_crosses_threads() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = SessionNotifier::new(tx);

        let remote = notifier.clone();
        std::thread::spawn(move || {
            assert!(remote.notify(event(SessionEventKind::Save, "/tmp/x/")));
        })
        .join()
        .unwrap();

        match rx.try_recv().unwrap() {
            AppEvent::Session(e) => assert_eq!(e.session_dir, "/tmp/x/"),
            other => panic!("unexpected event: {:?}", other),
        }

        drop(rx);
        assert!(!notifier.notify(event(SessionEventKind::Save, "/tmp/y/")));
    }
}
