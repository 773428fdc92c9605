//! Durable settings backend on top of an embedded sled database
//!
//! Each settings key is a sled key holding the JSON encoding of its
//! [`SettingValue`]. Flushing maps directly to [`sled::Db::flush`], so a
//! successful flush means the data survived to disk.

use super::backend::{SettingsBackend, StoreResult};
use super::value::SettingValue;
use crate::error::StoreError;
use std::path::Path;
use tracing::{debug, info, trace};

/// Settings backend persisted in a sled database directory
#[derive(Clone)]
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    /// Open (or create) the database at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the sled database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        info!("Settings database opened at: {}", path.display());
        Ok(Self { db })
    }
}

impl SettingsBackend for SledBackend {
    fn get(&self, key: &str) -> StoreResult<Option<SettingValue>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: SettingValue) -> StoreResult<()> {
        let json = serde_json::to_vec(&value)?;
        self.db.insert(key.as_bytes(), json)?;
        trace!("Setting written: {}", key);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.db.remove(key.as_bytes())?;

        let nested = format!("{}/", key);
        for entry in self.db.scan_prefix(nested.as_bytes()).keys() {
            self.db.remove(entry?)?;
        }
        Ok(())
    }

    fn keys_under(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.db
            .scan_prefix(prefix.as_bytes())
            .keys()
            .map(|k| {
                k.map(|k| String::from_utf8_lossy(&k).into_owned())
                    .map_err(StoreError::from)
            })
            .collect()
    }

    fn flush(&mut self) -> StoreResult<()> {
        let bytes = self.db.flush()?;
        debug!("Settings database flushed ({} bytes)", bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let temp = tempdir().unwrap();
        let db_path = temp.path().join("settings.sled");

        {
            let mut backend = SledBackend::open(&db_path).unwrap();
            backend.set("Default/KnobDialMode", 2.into()).unwrap();
            backend.set("Presets/Bass", "/tmp/bass.preset".into()).unwrap();
            backend.flush().unwrap();
        }

        let backend = SledBackend::open(&db_path).unwrap();
        assert_eq!(
            backend.get("Default/KnobDialMode").unwrap(),
            Some(SettingValue::Int(2))
        );
        assert_eq!(
            backend.get("Presets/Bass").unwrap(),
            Some(SettingValue::from("/tmp/bass.preset"))
        );
    }

    #[test]
    fn test_remove_and_scan() {
        let temp = tempdir().unwrap();
        let mut backend = SledBackend::open(temp.path().join("s.sled")).unwrap();

        backend.set("Controllers/Control_1_CC_7", 100.into()).unwrap();
        backend.set("Controllers/Control_2_CC_1", 5.into()).unwrap();
        backend.set("Presets/Pad", "/x".into()).unwrap();

        assert_eq!(backend.keys_under("Controllers/").unwrap().len(), 2);

        backend.remove("Controllers/Control_1_CC_7").unwrap();
        assert_eq!(
            backend.keys_under("Controllers/").unwrap(),
            vec!["Controllers/Control_2_CC_1".to_string()]
        );
    }
}
