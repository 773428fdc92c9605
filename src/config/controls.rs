//! Controller mapping persistence
//!
//! One key per mapping under the controllers group, e.g.
//! `Controllers/Control_1_CC_7 = 100`.

use super::Config;
use crate::controls::{ControlKeyText, Controls};
use crate::error::ControlKeyError;
use crate::settings::{SettingsBackend, StoreResult};
use tracing::{debug, warn};

pub const CONTROLS_GROUP: &str = "/Controllers";

impl<B: SettingsBackend> Config<B> {
    /// Replace `controls` with the mappings stored in settings.
    ///
    /// Keys without the controller prefix are skipped silently; other
    /// malformed keys are skipped with a warning.
    pub fn load_controls(&mut self, controls: &mut Controls) -> StoreResult<()> {
        controls.clear();

        let g = self.settings.group(CONTROLS_GROUP);
        for key in g.child_keys()? {
            match ControlKeyText::parse(&key) {
                Ok(text) => {
                    let value = g.int(&key, 0)? as i32;
                    controls.add_control(text.to_key(), value);
                }
                Err(ControlKeyError::MissingPrefix) => {
                    debug!("Ignoring unrelated key in controllers group: {}", key);
                }
                Err(e) => {
                    warn!("Skipping malformed controller key {:?}: {}", key, e);
                }
            }
        }

        debug!("Loaded {} controller mappings", controls.len());
        Ok(())
    }

    /// Clear the stored mappings and write `controls` in their place
    pub fn save_controls(&mut self, controls: &Controls) -> StoreResult<()> {
        self.clear_controls()?;

        {
            let mut g = self.settings.group(CONTROLS_GROUP);
            for (key, value) in controls.iter() {
                let Some(text) = ControlKeyText::from_key(key) else {
                    warn!(
                        "Not saving controller mapping with unknown type (status 0x{:02X})",
                        key.status
                    );
                    continue;
                };
                g.set_value(&text.to_string(), *value)?;
            }
        }

        self.settings.flush()?;
        debug!("Saved {} controller mappings", controls.len());
        Ok(())
    }

    /// Remove every key in the controllers group
    pub fn clear_controls(&mut self) -> StoreResult<()> {
        let mut g = self.settings.group(CONTROLS_GROUP);
        for key in g.child_keys()? {
            g.remove(&key)?;
        }
        Ok(())
    }
}
