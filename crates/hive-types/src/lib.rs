//! Foundation types for Hive.
//!
//! Hive is an access layer over a hierarchical, typed key-value store. Nodes
//! are addressed by path; values hang off nodes and carry a type tag plus a
//! binary payload. This crate holds the vocabulary shared by the store
//! service and the access layer built on top of it.
//!
//! # Key Types
//!
//! - [`ValueType`]: Closed set of value type tags with stable numeric codes
//! - [`ValueInfo`]: Size and type reported by a value query
//! - [`AccessMask`]: Capability mask requested when opening or creating a node
//! - [`Disposition`]: Whether a create-or-open call created the node
//! - [`NodeRef`]: Opaque, process-local reference to an open node

pub mod access;
pub mod error;
pub mod node;
pub mod value;

pub use access::{AccessMask, Disposition};
pub use error::TypeError;
pub use node::NodeRef;
pub use value::{ValueInfo, ValueType, TERMINATOR};
