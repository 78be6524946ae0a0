//! Node references handed out by the store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, process-local reference to an open node.
///
/// A `NodeRef` is what the store hands out from open/create and what every
/// other store call takes. It is only a token: it does not close anything
/// when dropped. Ownership and release are the job of the access layer's
/// `OwnedNode` and `NodeHandle`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(u64);

impl NodeRef {
    /// Wrap a store-issued reference number.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The store-issued reference number.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef(#{})", self.0)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
