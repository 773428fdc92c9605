//! Preset files
//!
//! A preset is the synth's parameter state saved as a JSON document. The
//! DSP engine owns the actual parameter values; this module only moves them
//! between memory and disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Preset document as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    /// Version of the application that wrote the file
    #[serde(default)]
    pub version: String,
    /// Parameter name -> value
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: crate::APP_VERSION.to_string(),
            params: BTreeMap::new(),
        }
    }

    /// Read a preset file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read preset file: {}", path.display()))?;

        let preset: Preset = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse preset file: {}", path.display()))?;

        debug!(
            "Preset loaded: {} ({} params, version {})",
            preset.name,
            preset.params.len(),
            preset.version
        );
        Ok(preset)
    }

    /// Write the preset as pretty-printed JSON
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize preset")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write preset file: {}", path.display()))?;
        Ok(())
    }
}

/// Anything that can write the current application state as a preset file
pub trait PresetWriter {
    fn save_preset(&mut self, path: &Path) -> Result<()>;
}

/// Current in-memory preset plus the file it came from
#[derive(Debug, Clone, Default)]
pub struct PresetState {
    pub preset: Preset,
    pub file: Option<PathBuf>,
}

impl PresetState {
    pub fn new() -> Self {
        Self {
            preset: Preset::new(""),
            file: None,
        }
    }

    /// Replace the current state with the preset stored at `path`
    pub fn load_preset(&mut self, path: &Path) -> Result<()> {
        self.preset = Preset::load_from_file(path)?;
        self.file = Some(path.to_path_buf());
        info!("Preset loaded: {}", path.display());
        Ok(())
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: f32) {
        self.preset.params.insert(name.into(), value);
    }

    pub fn name(&self) -> &str {
        &self.preset.name
    }
}

impl PresetWriter for PresetState {
    /// Save under `path`; the preset takes the file's base name
    fn save_preset(&mut self, path: &Path) -> Result<()> {
        if let Some(stem) = path.file_stem() {
            self.preset.name = stem.to_string_lossy().into_owned();
        }
        self.preset.version = crate::APP_VERSION.to_string();
        self.preset.save_to_file(path)?;
        self.file = Some(path.to_path_buf());
        info!("Preset saved: {}", path.display());
        Ok(())
    }
}
