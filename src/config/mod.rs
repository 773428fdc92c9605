//! Persistent application configuration
//!
//! [`Config`] owns the [`Settings`] tree and is constructed explicitly by
//! the application, then handed to whatever needs it. Top-level options are
//! read on [`Config::open`] and written back by [`Config::save`]. The preset
//! registry, bank/program catalog and controller mappings are persisted
//! through methods defined in the submodules.

mod controls;
mod presets;
mod programs;

pub use controls::CONTROLS_GROUP;
pub use presets::PRESETS_GROUP;
pub use programs::{BANK_PREFIX, PROGRAMS_GROUP};

use crate::settings::{Settings, SettingsBackend, SledBackend, StoreResult};
use crate::APP_VERSION;
use std::path::Path;
use tracing::{debug, info};

/// Application options plus the settings store they live in
pub struct Config<B: SettingsBackend> {
    settings: Settings<B>,

    /// Name of the last loaded/saved preset
    pub preset: String,
    /// Directory the preset file dialogs start in
    pub preset_dir: String,
    pub knob_dial_mode: i32,
    pub programs_preview: bool,
    pub use_native_dialogs: bool,
    /// Run-time only; derived from `use_native_dialogs` on load, never saved
    pub dont_use_native_dialogs: bool,
    pub custom_style_theme: String,
}

impl Config<SledBackend> {
    /// Open the sled settings database at `path` and load options from it
    pub fn open_at(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open(SledBackend::open(path)?)
    }
}

impl<B: SettingsBackend> Config<B> {
    /// Wrap `backend` and load the stored options
    pub fn open(backend: B) -> StoreResult<Self> {
        let mut config = Self {
            settings: Settings::new(backend),
            preset: String::new(),
            preset_dir: String::new(),
            knob_dial_mode: 0,
            programs_preview: false,
            use_native_dialogs: true,
            dont_use_native_dialogs: false,
            custom_style_theme: String::new(),
        };
        config.load()?;
        Ok(config)
    }

    /// Re-read top-level options, falling back to built-in defaults
    pub fn load(&mut self) -> StoreResult<()> {
        {
            let g = self.settings.group("/Default");
            self.preset = g.string("/Preset", "")?;
            self.preset_dir = g.string("/PresetDir", "")?;
            self.knob_dial_mode = g.int("/KnobDialMode", 0)? as i32;
        }
        {
            let g = self.settings.group("/Dialogs");
            self.programs_preview = g.bool("/ProgramsPreview", false)?;
            self.use_native_dialogs = g.bool("/UseNativeDialogs", true)?;
            self.dont_use_native_dialogs = !self.use_native_dialogs;
        }
        {
            let g = self.settings.group("/Custom");
            self.custom_style_theme = g.string("/StyleTheme", "")?;
        }

        debug!(
            "Configuration loaded (preset: {:?}, knob mode: {})",
            self.preset, self.knob_dial_mode
        );
        Ok(())
    }

    /// Write top-level options and the program version, then flush
    pub fn save(&mut self) -> StoreResult<()> {
        {
            let mut g = self.settings.group("/Program");
            g.set_value("/Version", APP_VERSION)?;
        }
        {
            let mut g = self.settings.group("/Default");
            g.set_value("/Preset", self.preset.as_str())?;
            g.set_value("/PresetDir", self.preset_dir.as_str())?;
            g.set_value("/KnobDialMode", self.knob_dial_mode)?;
        }
        {
            let mut g = self.settings.group("/Dialogs");
            g.set_value("/ProgramsPreview", self.programs_preview)?;
            g.set_value("/UseNativeDialogs", self.use_native_dialogs)?;
        }
        {
            let mut g = self.settings.group("/Custom");
            g.set_value("/StyleTheme", self.custom_style_theme.as_str())?;
        }

        self.settings.flush()?;
        info!("Configuration saved");
        Ok(())
    }

    pub fn settings(&self) -> &Settings<B> {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings<B> {
        &mut self.settings
    }

    pub fn into_backend(self) -> B {
        self.settings.into_backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryBackend;

    #[test]
    fn test_defaults_on_empty_store() {
        let config = Config::open(MemoryBackend::new()).unwrap();

        assert_eq!(config.preset, "");
        assert_eq!(config.knob_dial_mode, 0);
        assert!(!config.programs_preview);
        assert!(config.use_native_dialogs);
        assert!(!config.dont_use_native_dialogs);
        assert_eq!(config.custom_style_theme, "");
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = Config::open(MemoryBackend::new()).unwrap();
        config.preset = "Warm Pad".to_string();
        config.preset_dir = "/home/user/presets".to_string();
        config.knob_dial_mode = 2;
        config.programs_preview = true;
        config.use_native_dialogs = false;
        config.custom_style_theme = "Fusion".to_string();
        config.save().unwrap();

        let settings = config.settings();
        assert_eq!(
            settings.string("Program/Version", "").unwrap(),
            APP_VERSION.to_string()
        );
        assert_eq!(settings.backend().flush_count(), 1);

        let reloaded = Config::open(config.settings.into_backend()).unwrap();
        assert_eq!(reloaded.preset, "Warm Pad");
        assert_eq!(reloaded.preset_dir, "/home/user/presets");
        assert_eq!(reloaded.knob_dial_mode, 2);
        assert!(reloaded.programs_preview);
        assert!(!reloaded.use_native_dialogs);
        assert!(reloaded.dont_use_native_dialogs);
        assert_eq!(reloaded.custom_style_theme, "Fusion");
    }

    #[test]
    fn test_run_time_flag_not_persisted() {
        let mut config = Config::open(MemoryBackend::new()).unwrap();
        config.dont_use_native_dialogs = true;
        config.save().unwrap();

        let reloaded = Config::open(config.settings.into_backend()).unwrap();
        assert!(!reloaded.dont_use_native_dialogs);
    }
}
