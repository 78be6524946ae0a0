//! Writing values through a [`NodeHandle`].

use hive_types::ValueType;
use tracing::debug;

use crate::error::AccessResult;
use crate::handle::NodeHandle;
use crate::text;

impl NodeHandle {
    /// Store `data` under `name` exactly as given.
    pub fn write_raw(&self, name: &str, data: &[u8], value_type: ValueType) -> AccessResult<()> {
        let node = self.node()?;
        node.store()
            .set_value(node.raw(), name, data, value_type)?;
        debug!(node = %node.raw(), name, %value_type, len = data.len(), "value written");
        Ok(())
    }

    /// Write an Integer32 value, little-endian.
    pub fn write_u32(&self, name: &str, value: u32) -> AccessResult<()> {
        self.write_raw(name, &value.to_le_bytes(), ValueType::Integer32)
    }

    /// Write an Integer64 value, little-endian.
    pub fn write_u64(&self, name: &str, value: u64) -> AccessResult<()> {
        self.write_raw(name, &value.to_le_bytes(), ValueType::Integer64)
    }

    /// Write a String value. A terminator is appended unless `text` already
    /// ends with one; empty text is stored as a lone terminator.
    pub fn write_string(&self, name: &str, text: &str) -> AccessResult<()> {
        self.write_terminated(name, text.encode_utf16(), ValueType::String)
    }

    /// Write an ExpandableString value. References in `text` are stored
    /// verbatim.
    pub fn write_expandable_string(&self, name: &str, text: &str) -> AccessResult<()> {
        self.write_terminated(name, text.encode_utf16(), ValueType::ExpandableString)
    }

    /// Write text given as UTF-16 code units under a text type.
    pub fn write_string_units(
        &self,
        name: &str,
        units: &[u16],
        value_type: ValueType,
    ) -> AccessResult<()> {
        self.write_terminated(name, units.iter().copied(), value_type)
    }

    /// Write a MultiString value from its segments.
    pub fn write_multi_string<S: AsRef<str>>(&self, name: &str, segments: &[S]) -> AccessResult<()> {
        let node = self.node()?;
        let buf = text::encode_multi(segments, &*self.allocator)?;
        node.store()
            .set_value(node.raw(), name, &buf, ValueType::MultiString)?;
        debug!(node = %node.raw(), name, segments = segments.len(), "multi-string written");
        Ok(())
    }

    /// Write a Binary value.
    pub fn write_binary(&self, name: &str, data: &[u8]) -> AccessResult<()> {
        self.write_raw(name, data, ValueType::Binary)
    }

    fn write_terminated<I>(&self, name: &str, units: I, value_type: ValueType) -> AccessResult<()>
    where
        I: Iterator<Item = u16> + Clone,
    {
        self.node()?;
        let buf = text::encode_terminated(units, &*self.allocator)?;
        self.write_raw(name, &buf, value_type)
    }
}
