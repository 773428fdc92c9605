//! MIDI controller mappings
//!
//! A mapping associates a controller identity (channel, controller message
//! type, parameter number) with an integer value. The channel and type are
//! packed into one status byte the same way they are on the wire: type in
//! the high nibble, zero-based channel in the low nibble.
//!
//! Persisted keys use the text form `Control_<channel+1>_<TYPE>_<param>`,
//! handled by [`ControlKeyText`].

use crate::error::ControlKeyError;
use crate::settings::parse_int_or_zero;
use std::collections::BTreeMap;
use std::fmt;

/// Literal first segment of every persisted controller key
pub const CONTROL_PREFIX: &str = "Control";

/// Controller message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ControlType {
    /// 7-bit Control Change
    CC = 0x10,
    /// Registered Parameter Number
    RPN = 0x20,
    /// Non-Registered Parameter Number
    NRPN = 0x30,
    /// 14-bit Control Change (MSB/LSB pair)
    CC14 = 0x40,
}

impl ControlType {
    pub const ALL: [ControlType; 4] = [
        ControlType::CC,
        ControlType::RPN,
        ControlType::NRPN,
        ControlType::CC14,
    ];

    /// Canonical persisted text
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlType::CC => "CC",
            ControlType::RPN => "RPN",
            ControlType::NRPN => "NRPN",
            ControlType::CC14 => "CC14",
        }
    }

    /// Inverse of [`as_str`](Self::as_str)
    pub fn from_text(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == text)
    }

    /// Decode the type nibble of a packed status byte
    pub fn from_status(status: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| *t as u8 == status & 0xF0)
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packed controller identity: `status = type | channel`, plus parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlKey {
    pub status: u8,
    pub param: u16,
}

impl ControlKey {
    /// Build a key from a zero-based channel (masked to 0-15)
    pub fn new(channel: u8, control_type: ControlType, param: u16) -> Self {
        Self {
            status: control_type as u8 | (channel & 0x0F),
            param,
        }
    }

    /// Zero-based channel
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    pub fn control_type(&self) -> Option<ControlType> {
        ControlType::from_status(self.status)
    }
}

/// Text form of a persisted controller key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlKeyText {
    /// Zero-based channel
    pub channel: u8,
    pub control_type: ControlType,
    pub param: u16,
}

impl ControlKeyText {
    /// Parse `Control_<ch>_<TYPE>_<param>`.
    ///
    /// Numeric segments are read permissively (garbage reads as 0) and the
    /// channel wraps into 0-15, so `Control_0_...` decodes to channel 15.
    pub fn parse(key: &str) -> Result<Self, ControlKeyError> {
        let key = key.trim_start_matches('/');
        let segments: Vec<&str> = key.split('_').collect();

        if segments[0] != CONTROL_PREFIX {
            return Err(ControlKeyError::MissingPrefix);
        }
        // trailing segments past the parameter are ignored
        let [_, channel, type_text, param, ..] = segments.as_slice() else {
            return Err(ControlKeyError::WrongSegmentCount(segments.len()));
        };

        let control_type = ControlType::from_text(type_text)
            .ok_or_else(|| ControlKeyError::UnknownType(type_text.to_string()))?;
        let channel = parse_int_or_zero(channel).wrapping_sub(1) as u8 & 0x0F;
        let param = parse_int_or_zero(param) as u16;

        Ok(Self {
            channel,
            control_type,
            param,
        })
    }

    pub fn to_key(self) -> ControlKey {
        ControlKey::new(self.channel, self.control_type, self.param)
    }

    /// Text form of a packed key; `None` when the status has no known type
    pub fn from_key(key: &ControlKey) -> Option<Self> {
        Some(Self {
            channel: key.channel(),
            control_type: key.control_type()?,
            param: key.param,
        })
    }
}

impl fmt::Display for ControlKeyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            CONTROL_PREFIX,
            u16::from(self.channel) + 1,
            self.control_type,
            self.param
        )
    }
}

/// Controller mapping registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controls {
    map: BTreeMap<ControlKey, i32>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a mapping
    pub fn add_control(&mut self, key: ControlKey, value: i32) {
        self.map.insert(key, value);
    }

    pub fn find_control(&self, key: &ControlKey) -> Option<i32> {
        self.map.get(key).copied()
    }

    pub fn remove_control(&mut self, key: &ControlKey) -> Option<i32> {
        self.map.remove(key)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ControlKey, &i32)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
