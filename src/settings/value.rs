//! Typed values stored in the settings tree

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single stored setting: string, integer or boolean
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl SettingValue {
    /// Integer view of the value. Non-numeric strings read as 0.
    pub fn to_int(&self) -> i64 {
        match self {
            SettingValue::Int(i) => *i,
            SettingValue::Bool(b) => i64::from(*b),
            SettingValue::Str(s) => i64::from(parse_int_or_zero(s)),
        }
    }

    /// Boolean view of the value. Strings are false when empty, `0` or `false`.
    pub fn to_bool(&self) -> bool {
        match self {
            SettingValue::Bool(b) => *b,
            SettingValue::Int(i) => *i != 0,
            SettingValue::Str(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Str(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Str(s)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Int(i)
    }
}

impl From<i32> for SettingValue {
    fn from(i: i32) -> Self {
        SettingValue::Int(i64::from(i))
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

/// Permissive integer parser used for ids stored as key names.
///
/// Anything that is not a plain 32-bit integer, including out-of-range
/// numbers, yields 0 rather than an error.
// TODO: surface malformed ids as a warning once stored data is known clean.
pub fn parse_int_or_zero(s: &str) -> i32 {
    s.trim().parse::<i32>().unwrap_or(0)
}
