//! Error types for type conversions.

use thiserror::Error;

/// Errors produced by type conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown value type code: {0}")]
    UnknownTypeCode(u32),

    #[error("unknown value type name: {0}")]
    UnknownTypeName(String),
}
