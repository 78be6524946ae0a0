//! [`NodeHandle`]: an owner of zero or one open node.

use std::sync::Arc;

use hive_store::NodeStore;
use hive_types::{AccessMask, Disposition, NodeRef};
use tracing::debug;

use crate::buffer::{BufferAllocator, TrackingAllocator};
use crate::error::{AccessError, AccessResult};
use crate::node::OwnedNode;

/// Owns at most one open node and gives typed access to its values.
///
/// Replacing the owned node (create, open, [`set`](Self::set)) closes the
/// previous one first, and only once the new one has been obtained: a failed
/// call leaves the current node in place. [`take`](Self::take) is the only
/// way to move the node out without closing it.
///
/// Value access lives in the [`read`](crate::read) and [`write`](crate::write)
/// modules.
pub struct NodeHandle {
    store: Arc<dyn NodeStore>,
    pub(crate) allocator: Arc<dyn BufferAllocator>,
    node: Option<OwnedNode>,
}

impl NodeHandle {
    /// An empty handle on `store`.
    pub fn empty(store: Arc<dyn NodeStore>) -> Self {
        Self::with_allocator(store, Arc::new(TrackingAllocator::new()))
    }

    /// An empty handle that stages transient buffers in `allocator`.
    pub fn with_allocator(store: Arc<dyn NodeStore>, allocator: Arc<dyn BufferAllocator>) -> Self {
        Self {
            store,
            allocator,
            node: None,
        }
    }

    /// Open or create the node at `path`.
    ///
    /// With a `root` reference and a mask carrying any mutating capability
    /// (set-value, create-subkey, create-link) the node is created if it is
    /// missing. Otherwise it is only opened; a `root` of `None` resolves
    /// `path` from the store root and never creates.
    pub fn new(
        store: Arc<dyn NodeStore>,
        root: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> AccessResult<Self> {
        Self::new_with_allocator(store, Arc::new(TrackingAllocator::new()), root, path, access)
    }

    /// Like [`new`](Self::new), staging transient buffers in `allocator`.
    pub fn new_with_allocator(
        store: Arc<dyn NodeStore>,
        allocator: Arc<dyn BufferAllocator>,
        root: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> AccessResult<Self> {
        let mut handle = Self::with_allocator(store, allocator);
        if root.is_some() && access.is_mutating() {
            handle.create(root, path, access)?;
        } else {
            handle.open(root, path, access)?;
        }
        Ok(handle)
    }

    /// A handle owning an already-open node.
    pub fn from_owned(node: OwnedNode) -> Self {
        let mut handle = Self::empty(Arc::clone(node.store()));
        handle.node = Some(node);
        handle
    }

    /// Create the node at `path`, or open it if it exists.
    pub fn create(
        &mut self,
        root: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> AccessResult<Disposition> {
        let (node, disposition) = OwnedNode::create(Arc::clone(&self.store), root, path, access)?;
        debug!(node = %node.raw(), path, %disposition, "handle created node");
        self.set(node);
        Ok(disposition)
    }

    /// Create or open a direct child of the owned node and move to it.
    pub fn create_child(&mut self, name: &str, access: AccessMask) -> AccessResult<Disposition> {
        check_child_name(name)?;
        let parent = self.raw().ok_or(AccessError::InvalidReference)?;
        let (node, disposition) =
            OwnedNode::create_child(Arc::clone(&self.store), parent, name, access)?;
        debug!(node = %node.raw(), parent = %parent, name, %disposition, "handle created child");
        self.set(node);
        Ok(disposition)
    }

    /// Open the existing node at `path`.
    pub fn open(&mut self, root: Option<NodeRef>, path: &str, access: AccessMask) -> AccessResult<()> {
        let node = OwnedNode::open(Arc::clone(&self.store), root, path, access)?;
        debug!(node = %node.raw(), path, "handle opened node");
        self.set(node);
        Ok(())
    }

    /// Open an existing direct child of the owned node and move to it.
    pub fn open_child(&mut self, name: &str, access: AccessMask) -> AccessResult<()> {
        check_child_name(name)?;
        let parent = self.raw().ok_or(AccessError::InvalidReference)?;
        self.open(Some(parent), name, access)
    }

    /// Release the owned node, if any. Calling this again is a no-op.
    pub fn close(&mut self) {
        self.node = None;
    }

    /// Adopt `node`, closing the one currently owned.
    pub fn set(&mut self, node: OwnedNode) {
        self.close();
        self.store = Arc::clone(node.store());
        self.node = Some(node);
    }

    /// Move the owned node out without closing it. The handle becomes empty.
    pub fn take(&mut self) -> Option<OwnedNode> {
        self.node.take()
    }

    /// The owned reference, for use as the root of another open or create.
    pub fn raw(&self) -> Option<NodeRef> {
        self.node.as_ref().map(OwnedNode::raw)
    }

    /// Returns `true` if the handle owns a node.
    pub fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    /// The store this handle opens nodes in.
    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    pub(crate) fn node(&self) -> AccessResult<&OwnedNode> {
        self.node.as_ref().ok_or(AccessError::InvalidReference)
    }
}

fn check_child_name(name: &str) -> AccessResult<()> {
    if name.is_empty() {
        return Err(AccessError::InvalidName {
            name: name.to_string(),
            reason: "child name must not be empty".into(),
        });
    }
    Ok(())
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle")
            .field("node", &self.raw())
            .finish()
    }
}
