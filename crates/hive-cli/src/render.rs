//! Turning stored payloads into text and JSON.

use anyhow::{anyhow, bail, Context};
use hive_access::{text, RawValue};
use hive_store::SnapshotNode;
use hive_types::ValueType;
use serde_json::{json, Value};

/// Decode a payload according to its type tag.
pub fn to_json(value: &RawValue) -> anyhow::Result<Value> {
    let decoded = match value.value_type {
        ValueType::Integer32 => json!(u32::from_le_bytes(fixed(&value.data)?)),
        ValueType::Integer64 => json!(u64::from_le_bytes(fixed(&value.data)?)),
        ValueType::String | ValueType::ExpandableString => {
            json!(text::decode_string(&value.data)?)
        }
        ValueType::MultiString => json!(text::decode_multi(&value.data)?),
        ValueType::Binary | ValueType::Unspecified => json!(hex::encode(&value.data)),
    };
    Ok(decoded)
}

/// One-line rendering for text output.
pub fn to_text(value: &RawValue) -> anyhow::Result<String> {
    Ok(match to_json(value)? {
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    })
}

fn fixed<const N: usize>(data: &[u8]) -> anyhow::Result<[u8; N]> {
    data.try_into()
        .map_err(|_| anyhow!("expected {N} bytes, found {}", data.len()))
}

/// The single argument of a non-list value. No argument is empty text.
pub fn single(value_type: ValueType, values: &[String]) -> anyhow::Result<&str> {
    match values {
        [] => Ok(""),
        [one] => Ok(one.as_str()),
        _ => bail!("{value_type} takes a single value, got {}", values.len()),
    }
}

/// Decimal or `0x`-prefixed hexadecimal.
pub fn parse_int(s: &str) -> anyhow::Result<u64> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("invalid integer {s:?}"))
}

/// Render a subtree with decoded values.
pub fn export(node: &SnapshotNode) -> anyhow::Result<Value> {
    let mut values = serde_json::Map::new();
    for value in &node.values {
        let raw = RawValue {
            data: value.data.clone(),
            value_type: value.value_type,
        };
        values.insert(
            value.name.clone(),
            json!({ "type": value.value_type.name(), "data": to_json(&raw)? }),
        );
    }
    let children = node
        .children
        .iter()
        .map(export)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(json!({
        "name": node.name,
        "values": values,
        "children": children,
    }))
}
