//! Hierarchical settings adapter
//!
//! Wraps a flat [`SettingsBackend`] with nested groups, the way an
//! INI/registry style settings API works: enter a group, read and write
//! keys relative to it, leave the group.
//!
//! Groups are entered through [`Settings::group`], which returns a
//! [`GroupGuard`]. The guard dereferences to the settings and leaves the
//! group when dropped, so the group stack stays balanced on every exit path,
//! including early returns through `?`.
//!
//! ```ignore
//! let mut settings = Settings::new(MemoryBackend::new());
//! {
//!     let mut presets = settings.group("/Presets");
//!     presets.set_value("Bass", "/home/me/bass.preset")?;
//! } // group left here
//! assert_eq!(settings.depth(), 0);
//! ```

mod backend;
mod sled_backend;
mod value;

pub use backend::{MemoryBackend, SettingsBackend, StoreResult};
pub use sled_backend::SledBackend;
pub use value::{parse_int_or_zero, SettingValue};

use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Settings tree with a group stack over a storage backend
pub struct Settings<B: SettingsBackend> {
    backend: B,
    /// Entered groups, each already normalized (may span several segments)
    groups: Vec<String>,
}

impl<B: SettingsBackend> Settings<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            groups: Vec::new(),
        }
    }

    /// Enter `name` (relative to the current group) until the guard drops
    pub fn group(&mut self, name: &str) -> GroupGuard<'_, B> {
        let name = normalize(name);
        trace!("Entering settings group: {}", name);
        self.groups.push(name);
        GroupGuard { settings: self }
    }

    fn end_group(&mut self) {
        if let Some(name) = self.groups.pop() {
            trace!("Leaving settings group: {}", name);
        }
    }

    /// Number of currently entered groups
    pub fn depth(&self) -> usize {
        self.groups.len()
    }

    /// Full path of the current group (empty at the root)
    pub fn group_path(&self) -> String {
        self.groups
            .iter()
            .filter(|g| !g.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("/")
    }

    fn full_key(&self, key: &str) -> String {
        let group = self.group_path();
        let key = normalize(key);
        if group.is_empty() {
            key
        } else {
            format!("{}/{}", group, key)
        }
    }

    /// Keys stored directly in the current group, in backend order.
    ///
    /// Keys of nested groups are not included.
    pub fn child_keys(&self) -> StoreResult<Vec<String>> {
        let group = self.group_path();
        let prefix = if group.is_empty() {
            String::new()
        } else {
            format!("{}/", group)
        };

        Ok(self
            .backend
            .keys_under(&prefix)?
            .into_iter()
            .filter_map(|k| {
                let rest = &k[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect())
    }

    /// Raw value for `key`, `None` if absent
    pub fn value(&self, key: &str) -> StoreResult<Option<SettingValue>> {
        self.backend.get(&self.full_key(key))
    }

    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.value(key)?.is_some())
    }

    /// String value for `key`, or `default` when absent
    pub fn string(&self, key: &str, default: &str) -> StoreResult<String> {
        Ok(self
            .value(key)?
            .map(|v| v.to_string())
            .unwrap_or_else(|| default.to_string()))
    }

    /// Integer value for `key`, or `default` when absent
    pub fn int(&self, key: &str, default: i64) -> StoreResult<i64> {
        Ok(self.value(key)?.map(|v| v.to_int()).unwrap_or(default))
    }

    /// Boolean value for `key`, or `default` when absent
    pub fn bool(&self, key: &str, default: bool) -> StoreResult<bool> {
        Ok(self.value(key)?.map(|v| v.to_bool()).unwrap_or(default))
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<SettingValue>) -> StoreResult<()> {
        let full = self.full_key(key);
        self.backend.set(&full, value.into())
    }

    /// Remove `key` and anything nested below it
    pub fn remove(&mut self, key: &str) -> StoreResult<()> {
        let full = self.full_key(key);
        self.backend.remove(&full)
    }

    /// Write everything through to durable storage
    pub fn flush(&mut self) -> StoreResult<()> {
        self.backend.flush()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

/// Scoped group membership; leaves the group on drop
pub struct GroupGuard<'a, B: SettingsBackend> {
    settings: &'a mut Settings<B>,
}

impl<B: SettingsBackend> Deref for GroupGuard<'_, B> {
    type Target = Settings<B>;

    fn deref(&self) -> &Self::Target {
        self.settings
    }
}

impl<B: SettingsBackend> DerefMut for GroupGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.settings
    }
}

impl<B: SettingsBackend> Drop for GroupGuard<'_, B> {
    fn drop(&mut self) {
        self.settings.end_group();
    }
}

/// Strip leading/trailing/duplicate slashes: `"/Presets/"` -> `"Presets"`
fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
