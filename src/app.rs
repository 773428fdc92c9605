//! Application event loop
//!
//! Everything that touches the configuration, the catalogs or the current
//! preset runs here, on one task. Other threads (session host callbacks,
//! the console) talk to it only by posting [`AppEvent`]s through a
//! [`SessionNotifier`].

use crate::config::Config;
use crate::controls::{ControlKeyText, Controls};
use crate::preset::PresetState;
use crate::programs::Programs;
use crate::session::{SessionEvent, SessionHandler, SessionHost, SessionNotifier, SessionOutcome};
use crate::settings::SettingsBackend;
use anyhow::{Context, Result};
use std::future::Future;
use std::ops::ControlFlow;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Messages processed by the application loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Session manager request
    Session(SessionEvent),
    /// Log the presets whose files exist
    ListPresets,
    /// Log the bank/program catalog
    ListBanks,
    /// Log the controller mappings
    ListControls,
    /// Save everything and leave the loop
    Quit,
}

/// Application state owned by the event loop
pub struct App<B: SettingsBackend, H: SessionHost> {
    config: Config<B>,
    programs: Programs,
    controls: Controls,
    preset: PresetState,
    session: SessionHandler,
    host: H,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl<B: SettingsBackend, H: SessionHost> App<B, H> {
    /// Build the application and populate the catalogs from `config`
    pub fn new(mut config: Config<B>, session: SessionHandler, host: H) -> Result<Self> {
        let mut programs = Programs::new();
        config
            .load_programs(&mut programs)
            .context("Failed to load program banks")?;

        let mut controls = Controls::new();
        config
            .load_controls(&mut controls)
            .context("Failed to load controller mappings")?;

        info!(
            "Loaded {} banks and {} controller mappings",
            programs.len(),
            controls.len()
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            programs,
            controls,
            preset: PresetState::new(),
            session,
            host,
            events_tx,
            events_rx,
        })
    }

    /// Handle for posting events from other threads
    pub fn notifier(&self) -> SessionNotifier {
        SessionNotifier::new(self.events_tx.clone())
    }

    /// Load a preset file as the current state and register it by name
    pub fn load_preset(&mut self, path: &Path) -> Result<()> {
        self.preset.load_preset(path)?;
        self.config
            .set_preset_file(self.preset.name(), &path.display().to_string())
            .context("Failed to register preset")?;
        self.config.preset = self.preset.name().to_string();
        if let Some(dir) = path.parent() {
            self.config.preset_dir = dir.display().to_string();
        }
        Ok(())
    }

    /// Process one event; `Break` means the application should exit
    pub fn handle_event(&mut self, event: AppEvent) -> Result<ControlFlow<()>> {
        match event {
            AppEvent::Session(event) => {
                let outcome = self
                    .session
                    .handle(event, &mut self.preset, &mut self.host);
                if outcome == SessionOutcome::Quit {
                    return Ok(ControlFlow::Break(()));
                }
            }
            AppEvent::ListPresets => {
                let presets = self
                    .config
                    .preset_list()
                    .context("Failed to list presets")?;
                info!("{} presets available", presets.len());
                for name in presets {
                    let file = self.config.preset_file(&name)?;
                    info!("  {} -> {}", name, file);
                }
            }
            AppEvent::ListBanks => {
                info!("{} banks", self.programs.len());
                for bank in self.programs.banks() {
                    info!("  [{}] {} ({} programs)", bank.id(), bank.name(), bank.len());
                    for prog in bank.progs() {
                        info!("    [{}] {}", prog.id(), prog.name());
                    }
                }
            }
            AppEvent::ListControls => {
                info!("{} controller mappings", self.controls.len());
                for (key, value) in self.controls.iter() {
                    match ControlKeyText::from_key(key) {
                        Some(text) => info!("  {} = {}", text, value),
                        None => info!("  status 0x{:02X} param {} = {}", key.status, key.param, value),
                    }
                }
            }
            AppEvent::Quit => {
                info!("Quit requested");
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Run until a quit request or `shutdown` resolves, then save everything
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!("Application event loop started");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => {
                    debug!("Application event: {:?}", event);
                    if self.handle_event(event)?.is_break() {
                        break;
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping event loop");
                    break;
                }
            }
        }

        self.save_all()
    }

    /// Persist catalogs and options.
    ///
    /// Every part is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub fn save_all(&mut self) -> Result<()> {
        let results = [
            self.config
                .save_programs(&self.programs)
                .context("Failed to save program banks"),
            self.config
                .save_controls(&self.controls)
                .context("Failed to save controller mappings"),
            self.config.save().context("Failed to save configuration"),
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                error!("{:#}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("Application state saved");
                Ok(())
            }
        }
    }

    pub fn config(&self) -> &Config<B> {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config<B> {
        &mut self.config
    }

    pub fn programs(&self) -> &Programs {
        &self.programs
    }

    pub fn programs_mut(&mut self) -> &mut Programs {
        &mut self.programs
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    pub fn preset(&self) -> &PresetState {
        &self.preset
    }

    pub fn preset_mut(&mut self) -> &mut PresetState {
        &mut self.preset
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Tear down the loop and hand back the configuration
    pub fn into_config(self) -> Config<B> {
        if !self.events_rx.is_empty() {
            warn!("Discarding unprocessed application events");
        }
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{ControlKey, ControlType};
    use crate::session::{SessionEventKind, SESSION_DIR_TOKEN};
    use crate::error::StoreError;
    use crate::settings::{MemoryBackend, SettingValue, StoreResult};
    use std::time::Duration;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingHost {
        replies: Vec<(SessionEvent, String)>,
    }

    impl SessionHost for RecordingHost {
        fn reply(&mut self, event: SessionEvent, command_line: &str) -> Result<()> {
            self.replies.push((event, command_line.to_string()));
            Ok(())
        }
    }

    fn make_app() -> App<MemoryBackend, RecordingHost> {
        let config = Config::open(MemoryBackend::new()).unwrap();
        let session = SessionHandler::new("patchkeeper", "/usr/bin/patchkeeper");
        App::new(config, session, RecordingHost::default()).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_quit_from_foreign_thread() {
        let temp = tempdir().unwrap();
        let app_dir = temp.path().join("sess1").join("app");
        std::fs::create_dir_all(&app_dir).unwrap();

        let mut app = make_app();
        app.programs_mut().add_bank(2, "Leads").add_prog(5, "Init Lead");
        app.controls_mut()
            .add_control(ControlKey::new(0, ControlType::CC, 7), 100);

        let notifier = app.notifier();
        let session_dir = app_dir.to_str().unwrap().to_string();
        std::thread::spawn(move || {
            notifier.notify(SessionEvent {
                kind: SessionEventKind::SaveAndQuit,
                session_dir,
                client_uuid: "abc".to_string(),
            });
        });

        tokio::time::timeout(Duration::from_secs(5), app.run(std::future::pending()))
            .await
            .expect("loop should exit on save-and-quit")
            .unwrap();

        assert!(app_dir.join("sess1.patchkeeper").exists());
        assert_eq!(app.host().replies.len(), 1);
        assert!(app.host().replies[0].1.contains(SESSION_DIR_TOKEN));

        let config = app.into_config();
        let settings = config.settings();
        assert_eq!(settings.string("Programs/2", "").unwrap(), "Leads");
        assert_eq!(settings.int("Controllers/Control_1_CC_7", 0).unwrap(), 100);
    }

    #[tokio::test]
    async fn test_plain_save_keeps_loop_running() {
        let temp = tempdir().unwrap();
        let mut app = make_app();
        let notifier = app.notifier();

        notifier.notify(SessionEvent {
            kind: SessionEventKind::Save,
            session_dir: format!("{}/", temp.path().display()),
            client_uuid: "abc".to_string(),
        });
        notifier.send(AppEvent::ListBanks);
        notifier.send(AppEvent::Quit);

        app.run(std::future::pending()).await.unwrap();
        assert_eq!(app.host().replies.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_signal_saves_state() {
        let mut app = make_app();
        app.config_mut().knob_dial_mode = 1;
        app.programs_mut().add_bank(1, "Basses");

        app.run(async {}).await.unwrap();

        let config = app.into_config();
        let backend = config.settings().backend();
        assert!(backend.flush_count() >= 3);
        assert_eq!(config.settings().int("Default/KnobDialMode", 0).unwrap(), 1);
        assert_eq!(config.settings().string("Programs/1", "").unwrap(), "Basses");
    }

    /// Memory backend refusing writes below one key prefix
    struct RejectingBackend {
        inner: MemoryBackend,
        reject: &'static str,
    }

    impl SettingsBackend for RejectingBackend {
        fn get(&self, key: &str) -> StoreResult<Option<SettingValue>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: SettingValue) -> StoreResult<()> {
            if key.starts_with(self.reject) {
                return Err(StoreError::Backend(format!("read-only: {}", key)));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> StoreResult<()> {
            self.inner.remove(key)
        }

        fn keys_under(&self, prefix: &str) -> StoreResult<Vec<String>> {
            self.inner.keys_under(prefix)
        }

        fn flush(&mut self) -> StoreResult<()> {
            self.inner.flush()
        }
    }

    #[test]
    fn test_save_all_continues_past_failure() {
        let backend = RejectingBackend {
            inner: MemoryBackend::new(),
            reject: "Programs/",
        };
        let config = Config::open(backend).unwrap();
        let session = SessionHandler::new("patchkeeper", "/usr/bin/patchkeeper");
        let mut app = App::new(config, session, RecordingHost::default()).unwrap();

        app.programs_mut().add_bank(1, "Basses");
        app.controls_mut()
            .add_control(ControlKey::new(0, ControlType::CC, 7), 100);
        app.config_mut().knob_dial_mode = 2;

        let err = app.save_all().unwrap_err();
        assert!(format!("{:#}", err).contains("program banks"));

        let settings = app.config().settings();
        assert_eq!(settings.int("Controllers/Control_1_CC_7", 0).unwrap(), 100);
        assert_eq!(settings.int("Default/KnobDialMode", 0).unwrap(), 2);
        assert_eq!(settings.value("Programs/1").unwrap(), None);
    }

    #[tokio::test]
    async fn test_catalogs_restored_on_start() {
        let mut app = make_app();
        app.programs_mut().add_bank(4, "Keys").add_prog(0, "Piano");
        app.save_all().unwrap();

        let backend = app.into_config().into_backend();
        let config = Config::open(backend).unwrap();
        let session = SessionHandler::new("patchkeeper", "/usr/bin/patchkeeper");
        let app = App::new(config, session, RecordingHost::default()).unwrap();

        let bank = app.programs().bank(4).unwrap();
        assert_eq!(bank.name(), "Keys");
        assert_eq!(bank.prog(0).unwrap().name(), "Piano");
    }

    #[test]
    fn test_load_preset_updates_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Bright.patchkeeper");
        crate::preset::Preset::new("Bright").save_to_file(&path).unwrap();

        let mut app = make_app();
        app.load_preset(&path).unwrap();
        assert_eq!(app.config().preset, "Bright");
        assert_eq!(app.config().preset_dir, temp.path().display().to_string());
        assert_eq!(
            app.config_mut().preset_file("Bright").unwrap(),
            path.display().to_string()
        );
    }
}
