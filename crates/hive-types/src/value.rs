//! Value type tags.
//!
//! Every stored value carries one of the [`ValueType`] tags. The numeric
//! codes are fixed and are what goes on disk.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The terminator code unit that ends textual content.
pub const TERMINATOR: u16 = 0;

/// Type tag attached to every stored value.
///
/// The set is closed. Each tag has a stable numeric code, and that code is
/// what serialization writes and reads back. Text values are little-endian
/// UTF-16 code units and integers are little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum ValueType {
    /// No declared type. Payload is opaque.
    Unspecified,
    /// Terminated UTF-16 text.
    String,
    /// Terminated UTF-16 text holding unexpanded environment references.
    ExpandableString,
    /// Opaque bytes.
    Binary,
    /// Little-endian `u32`.
    Integer32,
    /// Sequence of terminated UTF-16 strings closed by an extra terminator.
    MultiString,
    /// Little-endian `u64`.
    Integer64,
}

impl ValueType {
    /// All type tags, in code order.
    pub const ALL: [ValueType; 7] = [
        ValueType::Unspecified,
        ValueType::String,
        ValueType::ExpandableString,
        ValueType::Binary,
        ValueType::Integer32,
        ValueType::MultiString,
        ValueType::Integer64,
    ];

    /// The stable numeric code for this tag.
    pub const fn code(self) -> u32 {
        match self {
            ValueType::Unspecified => 0,
            ValueType::String => 1,
            ValueType::ExpandableString => 2,
            ValueType::Binary => 3,
            ValueType::Integer32 => 4,
            ValueType::MultiString => 7,
            ValueType::Integer64 => 11,
        }
    }

    /// Parse a numeric code back into a tag.
    pub fn from_code(code: u32) -> Result<Self, TypeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(TypeError::UnknownTypeCode(code))
    }

    /// Short lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Unspecified => "none",
            ValueType::String => "sz",
            ValueType::ExpandableString => "expand-sz",
            ValueType::Binary => "binary",
            ValueType::Integer32 => "dword",
            ValueType::MultiString => "multi-sz",
            ValueType::Integer64 => "qword",
        }
    }
}

impl From<ValueType> for u32 {
    fn from(t: ValueType) -> u32 {
        t.code()
    }
}

impl TryFrom<u32> for ValueType {
    type Error = TypeError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownTypeName(s.to_string()))
    }
}

/// Size and type of a stored value, as reported by a value query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueInfo {
    /// Payload length in bytes.
    pub size: usize,
    /// Stored type tag.
    pub value_type: ValueType,
}

impl ValueInfo {
    pub fn new(size: usize, value_type: ValueType) -> Self {
        Self { size, value_type }
    }
}
