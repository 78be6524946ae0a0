//! Error types for the access layer.

use hive_store::StoreError;
use hive_types::{AccessMask, ValueType};
use thiserror::Error;

/// Errors returned by node handles and child cursors.
///
/// Store failures are passed through onto the variant of the same name. The
/// only store status this layer consumes itself is the size probe's
/// `BufferTooSmall` inside [`NodeHandle::read_value`](crate::NodeHandle::read_value).
#[derive(Debug, Error)]
pub enum AccessError {
    /// The node or value does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The reference lacks a capability the call needs.
    #[error("access denied: requires {needed:?}")]
    AccessDenied { needed: AccessMask },

    /// A fixed-capacity read was shorter than the stored payload.
    #[error("buffer too small: value is {required} bytes of type {value_type}")]
    BufferTooSmall {
        required: usize,
        value_type: ValueType,
    },

    /// The stored type tag is not the one the reader requires.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },

    /// A scoped allocation or store write could not be satisfied.
    #[error("out of memory: {requested} bytes requested")]
    OutOfMemory { requested: usize },

    /// The handle is empty, or the reference was closed.
    #[error("invalid node reference")]
    InvalidReference,

    /// A node or value name was rejected.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A name exceeds its bound. Names are never truncated.
    #[error("name is {len} code units, limit is {max}")]
    NameTooLong { len: usize, max: usize },

    /// A value to be written cannot be encoded.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A stored payload does not decode as the type it claims.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AccessError::NotFound(what),
            StoreError::AccessDenied { needed } => AccessError::AccessDenied { needed },
            StoreError::BufferTooSmall {
                required,
                value_type,
            } => AccessError::BufferTooSmall {
                required,
                value_type,
            },
            StoreError::InvalidReference(_) => AccessError::InvalidReference,
            StoreError::InvalidName { name, reason } => AccessError::InvalidName { name, reason },
            StoreError::NameTooLong { len, max } => AccessError::NameTooLong { len, max },
            StoreError::OutOfMemory { requested, .. } => AccessError::OutOfMemory { requested },
            other => AccessError::Store(other),
        }
    }
}

/// Convenience type alias for access-layer operations.
pub type AccessResult<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;
    use hive_types::NodeRef;

    #[test]
    fn store_errors_map_verbatim() {
        let err: AccessError = StoreError::BufferTooSmall {
            required: 12,
            value_type: ValueType::String,
        }
        .into();
        assert!(matches!(
            err,
            AccessError::BufferTooSmall {
                required: 12,
                value_type: ValueType::String
            }
        ));

        let err: AccessError = StoreError::InvalidReference(NodeRef::from_raw(3)).into();
        assert!(matches!(err, AccessError::InvalidReference));

        let err: AccessError = StoreError::OutOfMemory {
            requested: 10,
            limit: 4,
        }
        .into();
        assert!(matches!(err, AccessError::OutOfMemory { requested: 10 }));
    }

    #[test]
    fn persistence_errors_are_wrapped() {
        let err: AccessError = StoreError::Corrupt("bad magic".into()).into();
        assert!(matches!(err, AccessError::Store(StoreError::Corrupt(_))));
        assert!(err.to_string().contains("bad magic"));
    }
}
