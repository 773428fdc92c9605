//! Typed errors for the settings store and controller key codec

use thiserror::Error;

/// Failure reported by a [`SettingsBackend`](crate::settings::SettingsBackend)
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage engine failed (I/O, corruption, ...)
    #[error("settings backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded
    #[error("settings value codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Why a persisted controller key could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlKeyError {
    /// First segment is not the `Control` prefix (unrelated key)
    #[error("key does not start with the controller prefix")]
    MissingPrefix,

    /// Key has fewer than four `_`-separated segments
    #[error("expected at least 4 key segments, found {0}")]
    WrongSegmentCount(usize),

    /// Type segment is not one of the known controller types
    #[error("unknown controller type: {0}")]
    UnknownType(String),
}
