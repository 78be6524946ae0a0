//! Access layer for Hive.
//!
//! This crate sits between callers and a [`NodeStore`](hive_store::NodeStore).
//! Every store call is a blocking round-trip whose buffer sizes and type tags
//! must be handled exactly; this layer owns those decisions so callers never
//! size a buffer themselves.
//!
//! # Architecture
//!
//! - **Ownership**: [`OwnedNode`] is a move-only open reference that closes
//!   itself on drop. [`NodeHandle`] owns zero or one of them and closes the
//!   old one before adopting a new one.
//! - **Reads**: every read funnels through [`NodeHandle::read_raw`]. Variable
//!   sized values go through a size probe first ([`NodeHandle::read_value`]),
//!   so the probe's "buffer too small" never reaches the caller.
//! - **Writes**: string-family writers make sure the payload ends with a
//!   terminator before it is handed to the store.
//! - **Enumeration**: [`ChildCursor`] opens its own reference and walks the
//!   children from the last index down to zero.
//! - **Buffers**: every transient buffer is a [`ScopedBuffer`] from a
//!   [`BufferAllocator`], requested at the exact size and released on drop.
//!
//! # Modules
//!
//! - [`error`]: [`AccessError`] and the store-error mapping
//! - [`buffer`]: The allocator contract and [`TrackingAllocator`]
//! - [`node`]: [`OwnedNode`]
//! - [`handle`]: [`NodeHandle`] lifecycle
//! - [`read`] / [`write`]: Typed value access on [`NodeHandle`]
//! - [`text`]: UTF-16 terminator handling
//! - [`cursor`]: [`ChildCursor`]

pub mod buffer;
pub mod cursor;
pub mod error;
pub mod handle;
pub mod node;
pub mod read;
pub mod text;
pub mod write;

pub use buffer::{BufferAllocator, ScopedBuffer, TrackingAllocator};
pub use cursor::{ChildCursor, MAX_NAME_LEN};
pub use error::{AccessError, AccessResult};
pub use handle::NodeHandle;
pub use node::OwnedNode;
pub use read::RawValue;
