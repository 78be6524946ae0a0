//! Store service for Hive.
//!
//! This crate defines the contract between the Hive access layer and the
//! hierarchical store underneath it, and ships a reference backend that
//! honours that contract exactly.
//!
//! # The Contract
//!
//! [`NodeStore`] is a synchronous service. Callers open or create nodes by
//! path and receive a [`NodeRef`](hive_types::NodeRef); every other call
//! takes that reference. The service never sizes buffers for the caller:
//! [`NodeStore::query_value`] copies into the slice it is given and reports
//! [`StoreError::BufferTooSmall`] with the true size and type when the slice
//! is too short.
//!
//! # Backends
//!
//! - [`InMemoryNodeStore`]: arena-backed tree behind a `RwLock`, with
//!   case-insensitive matching, access-mask checks, and snapshot files
//!
//! # Design Rules
//!
//! 1. Paths and value names match case-insensitively; stored case is preserved.
//! 2. A reference is issued once and never recycled; closing it is idempotent.
//! 3. Every call checks the access mask the reference was opened with.
//! 4. Snapshot files are framed with a CRC; corruption is reported, never ignored.

pub mod config;
pub mod error;
pub mod memory;
pub mod path;
pub mod snapshot;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryNodeStore;
pub use snapshot::{SnapshotNode, SnapshotValue};
pub use traits::NodeStore;
