//! In-memory [`NodeStore`] backend.
//!
//! [`InMemoryNodeStore`] keeps the whole tree in an arena and tracks open
//! references in a table next to it. It is the backend the CLI and the
//! access-layer tests run against.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hive_types::{AccessMask, Disposition, NodeRef, ValueInfo, ValueType};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::path;
use crate::snapshot::{self, SnapshotNode, SnapshotValue};
use crate::traits::NodeStore;

/// Index of a node in the arena. Nodes are never removed, so ids are stable.
type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Clone, Debug)]
struct Node {
    name: String,
    depth: usize,
    /// Children keyed by folded name; iteration order is the enumeration order.
    children: BTreeMap<String, NodeId>,
    values: Vec<StoredValue>,
}

impl Node {
    fn new(name: &str, depth: usize) -> Self {
        Self {
            name: name.to_string(),
            depth,
            children: BTreeMap::new(),
            values: Vec::new(),
        }
    }

    fn value(&self, name: &str) -> Option<&StoredValue> {
        let key = path::fold(name);
        self.values.iter().find(|v| path::fold(&v.name) == key)
    }
}

#[derive(Clone, Debug)]
struct StoredValue {
    name: String,
    value_type: ValueType,
    data: Vec<u8>,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    node: NodeId,
    access: AccessMask,
}

#[derive(Debug)]
struct State {
    nodes: Vec<Node>,
    open: HashMap<NodeRef, OpenEntry>,
    next_ref: u64,
}

impl State {
    fn new() -> Self {
        Self {
            nodes: vec![Node::new("", 0)],
            open: HashMap::new(),
            next_ref: 1,
        }
    }

    fn entry(&self, node: NodeRef) -> StoreResult<OpenEntry> {
        self.open
            .get(&node)
            .copied()
            .ok_or(StoreError::InvalidReference(node))
    }

    /// Resolve an open reference and check it grants `needed`.
    fn granted(&self, node: NodeRef, needed: AccessMask) -> StoreResult<NodeId> {
        let entry = self.entry(node)?;
        if !entry.access.contains(needed) {
            return Err(StoreError::AccessDenied { needed });
        }
        Ok(entry.node)
    }

    /// Starting node for a path and, for relative paths, the parent's mask.
    fn base(&self, parent: Option<NodeRef>) -> StoreResult<(NodeId, Option<AccessMask>)> {
        match parent {
            Some(r) => {
                let entry = self.entry(r)?;
                Ok((entry.node, Some(entry.access)))
            }
            None => Ok((ROOT, None)),
        }
    }

    fn child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[node].children.get(&path::fold(name)).copied()
    }

    fn add_node(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(Node::new(name, depth));
        self.nodes[parent].children.insert(path::fold(name), id);
        id
    }

    fn issue(&mut self, node: NodeId, access: AccessMask) -> NodeRef {
        let r = NodeRef::from_raw(self.next_ref);
        self.next_ref += 1;
        self.open.insert(r, OpenEntry { node, access });
        r
    }

    fn to_snapshot(&self, id: NodeId) -> SnapshotNode {
        let node = &self.nodes[id];
        SnapshotNode {
            name: node.name.clone(),
            values: node
                .values
                .iter()
                .map(|v| SnapshotValue {
                    name: v.name.clone(),
                    value_type: v.value_type,
                    data: v.data.clone(),
                })
                .collect(),
            children: node
                .children
                .values()
                .map(|&child| self.to_snapshot(child))
                .collect(),
        }
    }

    fn restore(&mut self, id: NodeId, snap: &SnapshotNode) -> StoreResult<()> {
        for value in &snap.values {
            if self.nodes[id].value(&value.name).is_some() {
                return Err(StoreError::Corrupt(format!(
                    "duplicate value {:?} under {:?}",
                    value.name, snap.name
                )));
            }
            self.nodes[id].values.push(StoredValue {
                name: value.name.clone(),
                value_type: value.value_type,
                data: value.data.clone(),
            });
        }
        for child in &snap.children {
            if child.name.is_empty() || child.name.contains(path::is_separator) {
                return Err(StoreError::Corrupt(format!(
                    "invalid node name {:?}",
                    child.name
                )));
            }
            if self.child(id, &child.name).is_some() {
                return Err(StoreError::Corrupt(format!(
                    "duplicate node {:?} under {:?}",
                    child.name, snap.name
                )));
            }
            let child_id = self.add_node(id, &child.name);
            self.restore(child_id, child)?;
        }
        Ok(())
    }
}

/// In-memory hierarchical store.
///
/// Intended for tests, embedding, and the CLI. The whole tree lives in an
/// arena behind a `RwLock`; open references live in a table next to it.
/// Contents can be written to and read back from a snapshot file with
/// [`save`](Self::save) and [`load`](Self::load).
pub struct InMemoryNodeStore {
    state: RwLock<State>,
    config: StoreConfig,
}

impl InMemoryNodeStore {
    /// Create an empty store with default bounds.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given bounds.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            state: RwLock::new(State::new()),
            config,
        }
    }

    /// Bounds this store enforces.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of references currently open.
    pub fn open_count(&self) -> usize {
        self.read().open.len()
    }

    /// Number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    /// Copy the whole tree.
    pub fn snapshot(&self) -> SnapshotNode {
        self.read().to_snapshot(ROOT)
    }

    /// Copy the subtree at `path`, resolved from the root.
    pub fn snapshot_at(&self, path: &str) -> StoreResult<SnapshotNode> {
        let state = self.read();
        let mut current = ROOT;
        for segment in path::segments(path) {
            current = state
                .child(current, segment)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        }
        Ok(state.to_snapshot(current))
    }

    /// Build a store holding the contents of a snapshot.
    pub fn from_snapshot(root: &SnapshotNode, config: StoreConfig) -> StoreResult<Self> {
        let mut state = State::new();
        state.restore(ROOT, root)?;
        Ok(Self {
            state: RwLock::new(state),
            config,
        })
    }

    /// Write the tree to a snapshot file.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let root = self.snapshot();
        snapshot::write_file(path, &root)?;
        debug!(path = %path.display(), nodes = self.node_count(), "store saved");
        Ok(())
    }

    /// Read a store back from a snapshot file.
    pub fn load(path: &Path, config: StoreConfig) -> StoreResult<Self> {
        let root = snapshot::read_file(path)?;
        let store = Self::from_snapshot(&root, config)?;
        debug!(path = %path.display(), nodes = store.node_count(), "store loaded");
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_name(&self, name: &str) -> StoreResult<()> {
        let len = path::utf16_len(name);
        if len > self.config.max_name_len {
            return Err(StoreError::NameTooLong {
                len,
                max: self.config.max_name_len,
            });
        }
        Ok(())
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn open_node(
        &self,
        parent: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> StoreResult<NodeRef> {
        let mut state = self.write();
        let (mut current, _) = state.base(parent)?;
        for segment in path::segments(path) {
            current = state
                .child(current, segment)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        }
        let r = state.issue(current, access);
        debug!(node = %r, path, ?access, "node opened");
        Ok(r)
    }

    fn create_node(
        &self,
        parent: Option<NodeRef>,
        path: &str,
        access: AccessMask,
    ) -> StoreResult<(NodeRef, Disposition)> {
        let mut state = self.write();
        let (base, parent_access) = state.base(parent)?;

        // Validate everything before touching the tree.
        let segments: Vec<&str> = path::segments(path).collect();
        for segment in &segments {
            self.check_name(segment)?;
        }
        let depth = state.nodes[base].depth + segments.len();
        if depth > self.config.max_depth {
            return Err(StoreError::InvalidName {
                name: path.to_string(),
                reason: format!("depth {depth} exceeds {}", self.config.max_depth),
            });
        }

        let mut current = base;
        let mut disposition = Disposition::Opened;
        for segment in segments {
            match state.child(current, segment) {
                Some(id) => current = id,
                None => {
                    if let Some(granted) = parent_access {
                        if !granted.contains(AccessMask::CREATE_SUB_KEY) {
                            return Err(StoreError::AccessDenied {
                                needed: AccessMask::CREATE_SUB_KEY,
                            });
                        }
                    }
                    current = state.add_node(current, segment);
                    disposition = Disposition::Created;
                }
            }
        }

        let r = state.issue(current, access);
        debug!(node = %r, path, %disposition, ?access, "node created");
        Ok((r, disposition))
    }

    fn query_value(&self, node: NodeRef, name: &str, buf: &mut [u8]) -> StoreResult<ValueInfo> {
        let state = self.read();
        let id = state.granted(node, AccessMask::QUERY_VALUE)?;
        let value = state.nodes[id]
            .value(name)
            .ok_or_else(|| StoreError::NotFound(format!("value {name:?}")))?;

        if value.data.len() > buf.len() {
            return Err(StoreError::BufferTooSmall {
                required: value.data.len(),
                value_type: value.value_type,
            });
        }
        buf[..value.data.len()].copy_from_slice(&value.data);
        Ok(ValueInfo::new(value.data.len(), value.value_type))
    }

    fn set_value(
        &self,
        node: NodeRef,
        name: &str,
        data: &[u8],
        value_type: ValueType,
    ) -> StoreResult<()> {
        self.check_name(name)?;
        if data.len() > self.config.max_value_size {
            return Err(StoreError::OutOfMemory {
                requested: data.len(),
                limit: self.config.max_value_size,
            });
        }

        let mut state = self.write();
        let id = state.granted(node, AccessMask::SET_VALUE)?;
        let key = path::fold(name);
        let values = &mut state.nodes[id].values;
        match values.iter_mut().find(|v| path::fold(&v.name) == key) {
            Some(existing) => {
                existing.value_type = value_type;
                existing.data = data.to_vec();
            }
            None => values.push(StoredValue {
                name: name.to_string(),
                value_type,
                data: data.to_vec(),
            }),
        }
        debug!(node = %node, name, %value_type, len = data.len(), "value set");
        Ok(())
    }

    fn query_child_count(&self, node: NodeRef) -> StoreResult<u32> {
        let state = self.read();
        let id = state.granted(node, AccessMask::ENUMERATE_SUB_KEYS)?;
        Ok(state.nodes[id].children.len() as u32)
    }

    fn enumerate_child_at(
        &self,
        node: NodeRef,
        index: u32,
        capacity: usize,
    ) -> StoreResult<String> {
        let state = self.read();
        let id = state.granted(node, AccessMask::ENUMERATE_SUB_KEYS)?;
        let child = state.nodes[id]
            .children
            .values()
            .nth(index as usize)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("child index {index}")))?;

        let name = &state.nodes[child].name;
        let len = path::utf16_len(name);
        if len > capacity {
            return Err(StoreError::NameTooLong { len, max: capacity });
        }
        Ok(name.clone())
    }

    fn close_node(&self, node: NodeRef) {
        if self.write().open.remove(&node).is_some() {
            debug!(node = %node, "node closed");
        }
    }
}

impl std::fmt::Debug for InMemoryNodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("InMemoryNodeStore")
            .field("node_count", &state.nodes.len())
            .field("open_count", &state.open.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_all(store: &InMemoryNodeStore, path: &str) -> NodeRef {
        store.create_node(None, path, AccessMask::ALL).unwrap().0
    }

    // -----------------------------------------------------------------------
    // Open / create
    // -----------------------------------------------------------------------

    #[test]
    fn create_then_open() {
        let store = InMemoryNodeStore::new();
        let (r, disposition) = store.create_node(None, "A/B", AccessMask::ALL).unwrap();
        assert_eq!(disposition, Disposition::Created);
        store.close_node(r);

        let r = store.open_node(None, "A/B", AccessMask::READ).unwrap();
        store.close_node(r);
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn create_existing_reports_opened() {
        let store = InMemoryNodeStore::new();
        let (a, _) = store.create_node(None, "A", AccessMask::ALL).unwrap();
        let (b, disposition) = store.create_node(None, "a", AccessMask::ALL).unwrap();
        assert_eq!(disposition, Disposition::Opened);
        assert_ne!(a, b);
    }

    #[test]
    fn open_missing_is_not_found() {
        let store = InMemoryNodeStore::new();
        let err = store.open_node(None, "nope", AccessMask::READ).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn paths_match_case_insensitively() {
        let store = InMemoryNodeStore::new();
        open_all(&store, "Software\\Vendor");
        assert!(store.open_node(None, "SOFTWARE/vendor", AccessMask::READ).is_ok());
    }

    #[test]
    fn relative_open_and_create() {
        let store = InMemoryNodeStore::new();
        let parent = open_all(&store, "A");
        let (child, disposition) = store.create_child(parent, "x", AccessMask::ALL).unwrap();
        assert_eq!(disposition, Disposition::Created);
        store.close_node(child);

        assert!(store.open_node(Some(parent), "X", AccessMask::READ).is_ok());
        assert!(store.open_node(None, "A/x", AccessMask::READ).is_ok());
    }

    #[test]
    fn relative_create_needs_create_sub_key() {
        let store = InMemoryNodeStore::new();
        open_all(&store, "A/existing");
        let parent = store.open_node(None, "A", AccessMask::READ).unwrap();

        // Opening an existing child through create is allowed.
        let (_, disposition) = store
            .create_node(Some(parent), "existing", AccessMask::READ)
            .unwrap();
        assert_eq!(disposition, Disposition::Opened);

        let err = store
            .create_node(Some(parent), "fresh", AccessMask::ALL)
            .unwrap_err();
        assert!(matches!(err, StoreError::AccessDenied { .. }));
        assert!(store.open_node(None, "A/fresh", AccessMask::READ).is_err());
    }

    #[test]
    fn overlong_segment_is_rejected_before_creation() {
        let config = StoreConfig {
            max_name_len: 4,
            ..StoreConfig::default()
        };
        let store = InMemoryNodeStore::with_config(config);
        let err = store
            .create_node(None, "ok/toolong", AccessMask::ALL)
            .unwrap_err();
        assert!(matches!(err, StoreError::NameTooLong { len: 7, max: 4 }));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn depth_limit() {
        let config = StoreConfig {
            max_depth: 2,
            ..StoreConfig::default()
        };
        let store = InMemoryNodeStore::with_config(config);
        assert!(store.create_node(None, "a/b", AccessMask::ALL).is_ok());
        let err = store.create_node(None, "a/b/c", AccessMask::ALL).unwrap_err();
        assert!(matches!(err, StoreError::InvalidName { .. }));
    }

    // -----------------------------------------------------------------------
    // Values
    // -----------------------------------------------------------------------

    #[test]
    fn query_reports_size_and_type_when_too_small() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        store.set_value(r, "v", b"hello", ValueType::Binary).unwrap();

        let err = store.query_value(r, "v", &mut []).unwrap_err();
        match err {
            StoreError::BufferTooSmall {
                required,
                value_type,
            } => {
                assert_eq!(required, 5);
                assert_eq!(value_type, ValueType::Binary);
            }
            other => panic!("expected BufferTooSmall, got {other}"),
        }

        let mut buf = [0u8; 5];
        let info = store.query_value(r, "v", &mut buf).unwrap();
        assert_eq!(info, ValueInfo::new(5, ValueType::Binary));
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn query_never_writes_past_payload() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        store.set_value(r, "v", &[1, 2], ValueType::Binary).unwrap();

        let mut buf = [0xffu8; 4];
        let info = store.query_value(r, "v", &mut buf).unwrap();
        assert_eq!(info.size, 2);
        assert_eq!(buf, [1, 2, 0xff, 0xff]);
    }

    #[test]
    fn empty_value_fits_zero_capacity() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        store.set_value(r, "", &[], ValueType::Unspecified).unwrap();
        let info = store.query_value(r, "", &mut []).unwrap();
        assert_eq!(info, ValueInfo::new(0, ValueType::Unspecified));
    }

    #[test]
    fn set_replaces_case_insensitively() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        store.set_value(r, "Count", &[1, 0, 0, 0], ValueType::Integer32).unwrap();
        store.set_value(r, "COUNT", &[2, 0, 0, 0, 0, 0, 0, 0], ValueType::Integer64).unwrap();

        let mut buf = [0u8; 8];
        let info = store.query_value(r, "count", &mut buf).unwrap();
        assert_eq!(info.value_type, ValueType::Integer64);
        assert_eq!(store.snapshot().children[0].values.len(), 1);
    }

    #[test]
    fn missing_value_is_not_found() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        let err = store.query_value(r, "ghost", &mut [0u8; 8]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn access_mask_is_enforced() {
        let store = InMemoryNodeStore::new();
        open_all(&store, "A");
        let read_only = store.open_node(None, "A", AccessMask::READ).unwrap();
        let err = store
            .set_value(read_only, "v", &[0], ValueType::Binary)
            .unwrap_err();
        assert!(matches!(err, StoreError::AccessDenied { .. }));

        let set_only = store.open_node(None, "A", AccessMask::SET_VALUE).unwrap();
        assert!(matches!(
            store.query_value(set_only, "v", &mut []),
            Err(StoreError::AccessDenied { .. })
        ));
        assert!(matches!(
            store.query_child_count(set_only),
            Err(StoreError::AccessDenied { .. })
        ));
    }

    #[test]
    fn oversized_value_is_out_of_memory() {
        let config = StoreConfig {
            max_value_size: 4,
            ..StoreConfig::default()
        };
        let store = InMemoryNodeStore::with_config(config);
        let r = open_all(&store, "A");
        let err = store
            .set_value(r, "v", &[0u8; 5], ValueType::Binary)
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfMemory { requested: 5, limit: 4 }));
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    #[test]
    fn enumerate_children_in_name_order() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        for name in ["y", "X", "z"] {
            let (c, _) = store.create_child(r, name, AccessMask::ALL).unwrap();
            store.close_node(c);
        }

        assert_eq!(store.query_child_count(r).unwrap(), 3);
        let names: Vec<String> = (0..3)
            .map(|i| store.enumerate_child_at(r, i, 255).unwrap())
            .collect();
        assert_eq!(names, vec!["X", "y", "z"]);

        let err = store.enumerate_child_at(r, 3, 255).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn enumerate_reports_names_over_capacity() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        store.create_child(r, "longname", AccessMask::ALL).unwrap();
        let err = store.enumerate_child_at(r, 0, 4).unwrap_err();
        assert!(matches!(err, StoreError::NameTooLong { len: 8, max: 4 }));
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    #[test]
    fn closed_reference_is_invalid() {
        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "A");
        store.close_node(r);
        store.close_node(r);
        assert_eq!(store.open_count(), 0);

        let err = store.query_child_count(r).unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
        let err = store.open_node(Some(r), "x", AccessMask::READ).unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
    }

    #[test]
    fn references_are_never_recycled() {
        let store = InMemoryNodeStore::new();
        let first = open_all(&store, "A");
        store.close_node(first);
        let second = open_all(&store, "A");
        assert_ne!(first, second);
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hive.db");

        let store = InMemoryNodeStore::new();
        let r = open_all(&store, "Software/Vendor");
        store.set_value(r, "Version", &[3, 0, 0, 0], ValueType::Integer32).unwrap();
        store.save(&file).unwrap();

        let loaded = InMemoryNodeStore::load(&file, StoreConfig::default()).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());
        assert_eq!(loaded.open_count(), 0);

        let r = loaded.open_node(None, "software\\vendor", AccessMask::READ).unwrap();
        let mut buf = [0u8; 4];
        loaded.query_value(r, "version", &mut buf).unwrap();
        assert_eq!(u32::from_le_bytes(buf), 3);
    }

    #[test]
    fn snapshot_at_subtree() {
        let store = InMemoryNodeStore::new();
        open_all(&store, "A/B/C");
        let sub = store.snapshot_at("a/b").unwrap();
        assert_eq!(sub.name, "B");
        assert_eq!(sub.children.len(), 1);
        assert!(store.snapshot_at("A/missing").is_err());
    }

    #[test]
    fn duplicate_snapshot_children_are_corrupt() {
        let dup = SnapshotNode {
            name: String::new(),
            values: Vec::new(),
            children: vec![SnapshotNode::named("a"), SnapshotNode::named("A")],
        };
        let err = InMemoryNodeStore::from_snapshot(&dup, StoreConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
