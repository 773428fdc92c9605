//! Where the settings database and presets live.
//!
//! - **Portable mode**: a `.portable` marker file next to the executable keeps
//!   everything in that directory.
//! - **Installed mode** (default): `<config dir>/<domain>/<title>`, e.g.
//!   `~/.config/patchkeeper.org/patchkeeper` on Linux.

use crate::{APP_DOMAIN, APP_TITLE};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PORTABLE_MARKER: &str = ".portable";

#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Sled settings database directory
    pub settings_db: PathBuf,
    /// Default directory for preset files
    pub presets_dir: PathBuf,
    pub is_portable: bool,
}

impl AppPaths {
    /// Pick portable or installed paths for the running executable
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        if exe_dir.join(PORTABLE_MARKER).exists() {
            debug!("Portable mode ({} found in {})", PORTABLE_MARKER, exe_dir.display());
            return Self::under(exe_dir, true);
        }

        let base = dirs::config_dir()
            .unwrap_or_else(|| {
                warn!("No user config directory, falling back to {}", exe_dir.display());
                exe_dir.clone()
            })
            .join(APP_DOMAIN)
            .join(APP_TITLE);

        debug!("Installed mode (base dir: {})", base.display());
        Self::under(base, false)
    }

    /// Paths rooted at `base`
    pub fn under(base: impl Into<PathBuf>, is_portable: bool) -> Self {
        let base = base.into();
        Self {
            settings_db: base.join("settings.db"),
            presets_dir: base.join("presets"),
            is_portable,
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.settings_db
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create the base and preset directories if missing
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [self.base_dir(), self.presets_dir.clone()] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }
}
