//! [`OwnedNode`]: a single-owner open reference.

use std::sync::Arc;

use hive_store::NodeStore;
use hive_types::{AccessMask, Disposition, NodeRef};

use crate::error::AccessResult;

/// An open node reference with exactly one owner.
///
/// `OwnedNode` is move-only. Dropping it closes the reference in the store
/// it came from, so a reference cannot outlive its owner or be closed twice.
pub struct OwnedNode {
    store: Arc<dyn NodeStore>,
    raw: NodeRef,
}

impl OwnedNode {
    /// Open an existing node.
    pub fn open(
        store: Arc<dyn NodeStore>,
        root: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> AccessResult<Self> {
        let raw = store.open_node(root, path, access)?;
        Ok(Self { store, raw })
    }

    /// Create a node, or open it if it exists.
    pub fn create(
        store: Arc<dyn NodeStore>,
        root: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> AccessResult<(Self, Disposition)> {
        let (raw, disposition) = store.create_node(root, path, access)?;
        Ok((Self { store, raw }, disposition))
    }

    /// Create or open a direct child of `parent`.
    pub fn create_child(
        store: Arc<dyn NodeStore>,
        parent: NodeRef,
        name: &str,
        access: AccessMask,
    ) -> AccessResult<(Self, Disposition)> {
        let (raw, disposition) = store.create_child(parent, name, access)?;
        Ok((Self { store, raw }, disposition))
    }

    /// The store reference. Valid for as long as `self` is alive.
    pub fn raw(&self) -> NodeRef {
        self.raw
    }

    /// The store this reference belongs to.
    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }
}

impl Drop for OwnedNode {
    fn drop(&mut self) {
        self.store.close_node(self.raw);
    }
}

impl std::fmt::Debug for OwnedNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OwnedNode").field(&self.raw).finish()
    }
}
