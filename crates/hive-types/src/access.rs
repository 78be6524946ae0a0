//! Access masks and create dispositions.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Capabilities requested when opening or creating a node.
    ///
    /// The access layer passes the mask through untouched; only the store
    /// decides whether an operation is permitted by it.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AccessMask: u32 {
        const QUERY_VALUE = 0x0001;
        const SET_VALUE = 0x0002;
        const CREATE_SUB_KEY = 0x0004;
        const ENUMERATE_SUB_KEYS = 0x0008;
        const NOTIFY = 0x0010;
        const CREATE_LINK = 0x0020;

        const READ = Self::QUERY_VALUE.bits()
            | Self::ENUMERATE_SUB_KEYS.bits()
            | Self::NOTIFY.bits();
        const WRITE = Self::SET_VALUE.bits() | Self::CREATE_SUB_KEY.bits();
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::CREATE_LINK.bits();
    }
}

impl AccessMask {
    /// Returns `true` if the mask requests any capability that modifies the
    /// store (set-value, create-subkey, create-link).
    pub fn is_mutating(self) -> bool {
        self.intersects(Self::SET_VALUE | Self::CREATE_SUB_KEY | Self::CREATE_LINK)
    }
}

impl Default for AccessMask {
    fn default() -> Self {
        Self::READ
    }
}

/// Outcome of a create-or-open call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// The node did not exist and was created.
    Created,
    /// The node already existed and was opened.
    Opened,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Created => f.write_str("created"),
            Disposition::Opened => f.write_str("opened"),
        }
    }
}
