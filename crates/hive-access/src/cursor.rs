//! [`ChildCursor`]: reverse enumeration of a node's direct children.

use std::sync::Arc;

use hive_store::NodeStore;
use hive_types::{AccessMask, NodeRef};
use tracing::{debug, warn};

use crate::error::{AccessError, AccessResult};
use crate::node::OwnedNode;

/// Longest child name a cursor will read, in UTF-16 code units.
pub const MAX_NAME_LEN: usize = 255;

/// Walks the children of one node from the last index down to zero.
///
/// The cursor owns its own reference, independent of any
/// [`NodeHandle`](crate::NodeHandle). The child count is captured once when
/// the cursor is built and never refreshed, so children added or removed
/// meanwhile by another writer may be skipped, repeated, or fail to read.
///
/// The name at the highest index is read on construction.
/// [`advance`](Self::advance) moves one index down and reads again.
pub struct ChildCursor {
    node: Option<OwnedNode>,
    count: u32,
    index: i64,
    name: String,
    /// Failure of the read done on construction, handed out by the iterator.
    pending: Option<AccessError>,
    started: bool,
}

impl ChildCursor {
    /// Open `path` for enumeration.
    ///
    /// If the open fails the cursor is invalid and yields nothing; check
    /// [`is_valid`](Self::is_valid) before use.
    pub fn new(store: Arc<dyn NodeStore>, root: Option<NodeRef>, path: &str) -> Self {
        match OwnedNode::open(store, root, path, AccessMask::READ) {
            Ok(node) => Self::from_owned(node),
            Err(err) => {
                warn!(path, error = %err, "cursor could not open node");
                Self::invalid()
            }
        }
    }

    /// Enumerate the children of an already-open node, taking ownership of it.
    pub fn from_owned(node: OwnedNode) -> Self {
        let mut cursor = Self {
            node: Some(node),
            ..Self::invalid()
        };
        cursor.count = cursor.child_count();
        cursor.index = i64::from(cursor.count) - 1;
        debug!(count = cursor.count, "cursor opened");
        if cursor.index >= 0 {
            cursor.pending = cursor.read_current().err();
        }
        cursor
    }

    fn invalid() -> Self {
        Self {
            node: None,
            count: 0,
            index: -1,
            name: String::new(),
            pending: None,
            started: false,
        }
    }

    /// Returns `true` while the reference is open and the index is not
    /// below zero.
    pub fn is_valid(&self) -> bool {
        self.node.is_some() && self.index >= 0
    }

    /// Step to the next lower index and read the name there.
    ///
    /// Stepping below index zero makes the cursor permanently invalid and
    /// clears the name; that step itself is not an error. Advancing an
    /// invalid cursor does nothing.
    pub fn advance(&mut self) -> AccessResult<()> {
        self.started = true;
        self.pending = None;
        if !self.is_valid() {
            self.name.clear();
            return Ok(());
        }
        self.index -= 1;
        if self.index < 0 {
            self.name.clear();
            return Ok(());
        }
        self.read_current()
    }

    /// Name read at the current index. Empty when the cursor is invalid or
    /// the last read failed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current index; `-1` once the cursor is exhausted.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Child count captured when the cursor was built.
    pub fn snapshot_count(&self) -> u32 {
        self.count
    }

    /// Current number of direct children, or 0 if it cannot be queried.
    pub fn child_count(&self) -> u32 {
        self.try_child_count().unwrap_or_else(|err| {
            warn!(error = %err, "child count query failed");
            0
        })
    }

    /// Current number of direct children.
    pub fn try_child_count(&self) -> AccessResult<u32> {
        let node = self.node.as_ref().ok_or(AccessError::InvalidReference)?;
        Ok(node.store().query_child_count(node.raw())?)
    }

    fn read_current(&mut self) -> AccessResult<()> {
        self.name.clear();
        let node = self.node.as_ref().ok_or(AccessError::InvalidReference)?;
        let index = u32::try_from(self.index).map_err(|_| AccessError::InvalidReference)?;
        match node.store().enumerate_child_at(node.raw(), index, MAX_NAME_LEN) {
            Ok(name) => {
                self.name = name;
                Ok(())
            }
            Err(err) => {
                debug!(index, error = %err, "child name read failed");
                Err(err.into())
            }
        }
    }
}

impl Iterator for ChildCursor {
    type Item = AccessResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            if let Err(err) = self.advance() {
                return Some(Err(err));
            }
        }
        self.started = true;
        if !self.is_valid() {
            return None;
        }
        match self.pending.take() {
            Some(err) => Some(Err(err)),
            None => Some(Ok(self.name.clone())),
        }
    }
}

impl std::fmt::Debug for ChildCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildCursor")
            .field("node", &self.node.as_ref().map(OwnedNode::raw))
            .field("count", &self.count)
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}
