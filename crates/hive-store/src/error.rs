//! Error types for the store service.

use hive_types::{AccessMask, NodeRef, ValueType};

/// Errors reported by the store service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The node or value does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The reference was not opened with the capability the call needs.
    #[error("access denied: requires {needed:?}")]
    AccessDenied { needed: AccessMask },

    /// The caller's buffer is shorter than the stored payload.
    #[error("buffer too small: value is {required} bytes of type {value_type}")]
    BufferTooSmall {
        required: usize,
        value_type: ValueType,
    },

    /// The reference is closed or was never issued.
    #[error("invalid node reference {0}")]
    InvalidReference(NodeRef),

    /// A path segment or value name is not acceptable.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A name is longer than the caller's capacity or the store's bound.
    #[error("name is {len} code units, limit is {max}")]
    NameTooLong { len: usize, max: usize },

    /// The store cannot hold the payload.
    #[error("insufficient resources: {requested} bytes requested, limit {limit}")]
    OutOfMemory { requested: usize, limit: usize },

    /// A snapshot file failed its integrity checks.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
