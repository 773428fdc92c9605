//! Named preset registry: preset name -> preset file path

use super::Config;
use crate::settings::{SettingsBackend, StoreResult};
use std::path::Path;
use tracing::debug;

/// Settings group holding one `name = path` key per preset
pub const PRESETS_GROUP: &str = "/Presets/";

impl<B: SettingsBackend> Config<B> {
    /// File registered for `preset`, empty when unknown
    pub fn preset_file(&mut self, preset: &str) -> StoreResult<String> {
        let g = self.settings.group(PRESETS_GROUP);
        g.string(preset, "")
    }

    pub fn set_preset_file(&mut self, preset: &str, preset_file: &str) -> StoreResult<()> {
        let mut g = self.settings.group(PRESETS_GROUP);
        g.set_value(preset, preset_file)
    }

    /// Delete the preset's file (best effort) and always drop its entry
    pub fn remove_preset(&mut self, preset: &str) -> StoreResult<()> {
        let mut g = self.settings.group(PRESETS_GROUP);
        let preset_file = g.string(preset, "")?;
        if !preset_file.is_empty() && Path::new(&preset_file).exists() {
            if let Err(e) = std::fs::remove_file(&preset_file) {
                debug!("Could not delete preset file {}: {}", preset_file, e);
            }
        }
        g.remove(preset)
    }

    /// Registered presets whose file currently exists, in store order
    pub fn preset_list(&mut self) -> StoreResult<Vec<String>> {
        let g = self.settings.group(PRESETS_GROUP);
        let mut list = Vec::new();
        for preset in g.child_keys()? {
            let preset_file = g.string(&preset, "")?;
            if !preset_file.is_empty() && Path::new(&preset_file).exists() {
                list.push(preset);
            }
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::settings::MemoryBackend;
    use std::fs;
    use tempfile::tempdir;

    fn config() -> Config<MemoryBackend> {
        Config::open(MemoryBackend::new()).unwrap()
    }

    #[test]
    fn test_unknown_preset_is_empty() {
        let mut config = config();
        assert_eq!(config.preset_file("Nope").unwrap(), "");
    }

    #[test]
    fn test_list_hides_missing_files() {
        let temp = tempdir().unwrap();
        let bass = temp.path().join("bass.preset");
        let lead = temp.path().join("lead.preset");
        fs::write(&bass, "{}").unwrap();
        fs::write(&lead, "{}").unwrap();

        let mut config = config();
        config
            .set_preset_file("Bass", bass.to_str().unwrap())
            .unwrap();
        config
            .set_preset_file("Lead", lead.to_str().unwrap())
            .unwrap();
        config.set_preset_file("Ghost", "/no/such/file").unwrap();

        assert_eq!(config.preset_list().unwrap(), vec!["Bass", "Lead"]);

        // Deleting the file behind the registry's back hides the name
        fs::remove_file(&lead).unwrap();
        assert_eq!(config.preset_list().unwrap(), vec!["Bass"]);

        // ...but the mapping itself is kept
        assert_eq!(
            config.preset_file("Lead").unwrap(),
            lead.to_str().unwrap()
        );
        assert_eq!(config.preset_file("Ghost").unwrap(), "/no/such/file");
    }

    #[test]
    fn test_remove_deletes_file_and_key() {
        let temp = tempdir().unwrap();
        let pad = temp.path().join("pad.preset");
        fs::write(&pad, "{}").unwrap();

        let mut config = config();
        config.set_preset_file("Pad", pad.to_str().unwrap()).unwrap();
        config.remove_preset("Pad").unwrap();

        assert!(!pad.exists());
        assert_eq!(config.preset_file("Pad").unwrap(), "");
    }

    #[test]
    fn test_remove_with_missing_file_still_drops_key() {
        let mut config = config();
        config.set_preset_file("Gone", "/no/such/file").unwrap();
        config.remove_preset("Gone").unwrap();

        assert_eq!(config.preset_file("Gone").unwrap(), "");
        assert_eq!(config.settings().depth(), 0);
    }
}
