//! Reading values through a [`NodeHandle`].
//!
//! Everything funnels through [`NodeHandle::read_raw`], a single store query
//! with a fixed capacity. Values whose size is not known up front go through
//! [`NodeHandle::read_value`], which probes with capacity 0, allocates a
//! scoped buffer of exactly the reported size, and fetches once more.

use hive_types::ValueType;
use tracing::debug;

use crate::error::{AccessError, AccessResult};
use crate::handle::NodeHandle;
use crate::text;

/// A value as returned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawValue {
    /// Exactly the stored payload.
    pub data: Vec<u8>,
    /// Stored type tag.
    pub value_type: ValueType,
}

impl RawValue {
    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

fn check_type(expected: Option<ValueType>, actual: ValueType) -> AccessResult<()> {
    match expected {
        Some(expected) if expected != actual => Err(AccessError::TypeMismatch { expected, actual }),
        _ => Ok(()),
    }
}

impl NodeHandle {
    /// Query a value with exactly `size_hint` bytes of capacity.
    ///
    /// If the stored payload is larger this fails with `BufferTooSmall`
    /// carrying the real size and type, unless `expected` is set and the
    /// stored type differs, which is reported as `TypeMismatch` instead.
    pub fn read_raw(
        &self,
        name: &str,
        size_hint: usize,
        expected: Option<ValueType>,
    ) -> AccessResult<RawValue> {
        let node = self.node()?;
        let mut buf = self.allocator.allocate(size_hint)?;

        let info = match node.store().query_value(node.raw(), name, &mut buf) {
            Ok(info) => info,
            Err(err) => {
                let err = AccessError::from(err);
                if let AccessError::BufferTooSmall { value_type, .. } = &err {
                    check_type(expected, *value_type)?;
                }
                return Err(err);
            }
        };
        check_type(expected, info.value_type)?;

        let data = buf.get(..info.size).ok_or_else(|| {
            AccessError::Malformed(format!(
                "store reported {} bytes for a {size_hint}-byte buffer",
                info.size
            ))
        })?;
        Ok(RawValue {
            data: data.to_vec(),
            value_type: info.value_type,
        })
    }

    /// Read a value of unknown size: probe, then fetch at the exact size.
    ///
    /// The probe's `BufferTooSmall` is consumed here. A `BufferTooSmall` from
    /// the fetch (the value grew in between) is returned as-is; there is no
    /// retry.
    pub fn read_value(&self, name: &str, expected: Option<ValueType>) -> AccessResult<RawValue> {
        let (required, probed_type) = match self.read_raw(name, 0, None) {
            Ok(empty) => {
                check_type(expected, empty.value_type)?;
                return Ok(empty);
            }
            Err(AccessError::BufferTooSmall {
                required,
                value_type,
            }) => (required, value_type),
            Err(err) => return Err(err),
        };

        let value = self.read_raw(name, required, expected)?;
        if value.value_type != probed_type {
            debug!(
                name,
                probed = %probed_type,
                fetched = %value.value_type,
                "value type changed between probe and fetch"
            );
        }
        Ok(value)
    }

    /// Read an Integer32 value.
    pub fn read_u32(&self, name: &str) -> AccessResult<u32> {
        self.read_fixed(name, ValueType::Integer32).map(u32::from_le_bytes)
    }

    /// Read an Integer64 value.
    pub fn read_u64(&self, name: &str) -> AccessResult<u64> {
        self.read_fixed(name, ValueType::Integer64).map(u64::from_le_bytes)
    }

    /// Single read of exactly `N` bytes. A payload of any other length under
    /// the right type is malformed, whether shorter or longer.
    fn read_fixed<const N: usize>(
        &self,
        name: &str,
        value_type: ValueType,
    ) -> AccessResult<[u8; N]> {
        let value = match self.read_raw(name, N, Some(value_type)) {
            Ok(value) => value,
            Err(AccessError::BufferTooSmall { required, .. }) => {
                return Err(AccessError::Malformed(format!(
                    "{value_type} payload is {required} bytes"
                )))
            }
            Err(err) => return Err(err),
        };
        value.data.as_slice().try_into().map_err(|_| {
            AccessError::Malformed(format!("{value_type} payload is {} bytes", value.size()))
        })
    }

    /// Read a String value without its terminator.
    pub fn read_string(&self, name: &str) -> AccessResult<String> {
        let value = self.read_value(name, Some(ValueType::String))?;
        text::decode_string(&value.data)
    }

    /// Read an ExpandableString value without its terminator. References are
    /// returned unexpanded.
    pub fn read_expandable_string(&self, name: &str) -> AccessResult<String> {
        let value = self.read_value(name, Some(ValueType::ExpandableString))?;
        text::decode_string(&value.data)
    }

    /// Read a MultiString value as its list of segments.
    pub fn read_multi_string(&self, name: &str) -> AccessResult<Vec<String>> {
        let value = self.read_value(name, Some(ValueType::MultiString))?;
        text::decode_multi(&value.data)
    }

    /// Read a Binary value.
    pub fn read_binary(&self, name: &str) -> AccessResult<Vec<u8>> {
        Ok(self.read_value(name, Some(ValueType::Binary))?.data)
    }
}
