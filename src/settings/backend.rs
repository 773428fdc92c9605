//! Storage backends behind the hierarchical settings adapter
//!
//! A backend is a flat map of `/`-separated key paths to [`SettingValue`]s.
//! Group semantics (entering, leaving, listing child keys) live in
//! [`Settings`](super::Settings); backends only see full paths.

use super::value::SettingValue;
use crate::error::StoreError;
use std::collections::BTreeMap;

/// Result alias for settings operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Flat key/value storage used by [`Settings`](super::Settings)
pub trait SettingsBackend {
    /// Read the value stored at `key`, if any
    fn get(&self, key: &str) -> StoreResult<Option<SettingValue>>;

    /// Store `value` at `key`, replacing any previous value
    fn set(&mut self, key: &str, value: SettingValue) -> StoreResult<()>;

    /// Remove `key` together with every key nested below `key/`
    fn remove(&mut self, key: &str) -> StoreResult<()>;

    /// List every stored key starting with `prefix`, in backend order
    fn keys_under(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Make all previous writes durable
    fn flush(&mut self) -> StoreResult<()>;
}

/// Volatile in-memory backend
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, SettingValue>,
    flush_count: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times [`flush`](SettingsBackend::flush) was called
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Total number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SettingsBackend for MemoryBackend {
    fn get(&self, key: &str) -> StoreResult<Option<SettingValue>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: SettingValue) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        let nested = format!("{}/", key);
        self.entries.retain(|k, _| !k.starts_with(&nested));
        Ok(())
    }

    fn keys_under(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.flush_count += 1;
        Ok(())
    }
}
