//! The [`NodeStore`] contract.

use hive_types::{AccessMask, Disposition, NodeRef, ValueInfo, ValueType};

use crate::error::StoreResult;

/// The hierarchical store service.
///
/// All implementations must satisfy these invariants:
/// - Paths and value names compare case-insensitively.
/// - A `NodeRef` stays valid until `close_node`; afterwards every call taking
///   it fails with `InvalidReference`.
/// - `query_value` never writes past `buf.len()`. When the payload does not
///   fit it reports `BufferTooSmall` carrying the full size and stored type.
/// - Calls are synchronous and never retried internally.
pub trait NodeStore: Send + Sync {
    /// Open an existing node.
    ///
    /// `parent` of `None` resolves `path` from the store root. Fails with
    /// `NotFound` if any segment is missing.
    fn open_node(
        &self,
        parent: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> StoreResult<NodeRef>;

    /// Create a node, or open it if it already exists.
    ///
    /// Missing intermediate nodes are created as well. The disposition says
    /// whether the final node was created.
    fn create_node(
        &self,
        parent: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> StoreResult<(NodeRef, Disposition)>;

    /// Create or open a direct child of an open node.
    fn create_child(
        &self,
        parent: NodeRef,
        name: &str,
        access: AccessMask,
    ) -> StoreResult<(NodeRef, Disposition)> {
        self.create_node(Some(parent), name, access)
    }

    /// Copy a value's payload into `buf`.
    ///
    /// An empty `name` addresses the node's default value.
    fn query_value(&self, node: NodeRef, name: &str, buf: &mut [u8]) -> StoreResult<ValueInfo>;

    /// Create or replace a value.
    fn set_value(
        &self,
        node: NodeRef,
        name: &str,
        data: &[u8],
        value_type: ValueType,
    ) -> StoreResult<()>;

    /// Number of direct children of a node.
    fn query_child_count(&self, node: NodeRef) -> StoreResult<u32>;

    /// Name of the child at `index`, if it fits in `capacity` UTF-16 code units.
    ///
    /// Returns `NotFound` for an index past the last child and `NameTooLong`
    /// when the name exceeds `capacity`.
    fn enumerate_child_at(&self, node: NodeRef, index: u32, capacity: usize)
        -> StoreResult<String>;

    /// Release a reference. Closing an unknown or closed reference is a no-op.
    fn close_node(&self, node: NodeRef);
}
