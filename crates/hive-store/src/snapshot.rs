//! Snapshot files for the in-memory store.
//!
//! On-disk format:
//! ```text
//! [4 bytes: magic "HIVE"]
//! [4 bytes: format version (little-endian u32)]
//! [4 bytes: payload length (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload (bincode-serialized SnapshotNode tree)]
//! ```
//!
//! Files are written to a sibling `*.tmp` file and renamed over the target,
//! so a crash mid-write leaves the previous snapshot intact.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hive_types::ValueType;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::path;

const MAGIC: &[u8; 4] = b"HIVE";
const FORMAT_VERSION: u32 = 1;
/// Magic, version, length, CRC.
const HEADER_SIZE: usize = 16;

/// A node and everything beneath it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Name as created. Empty for the root.
    pub name: String,
    pub values: Vec<SnapshotValue>,
    /// Children in enumeration order.
    pub children: Vec<SnapshotNode>,
}

/// A stored value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotValue {
    pub name: String,
    pub value_type: ValueType,
    pub data: Vec<u8>,
}

impl SnapshotNode {
    /// An empty node with the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Direct child by name, matched case-insensitively.
    pub fn child(&self, name: &str) -> Option<&SnapshotNode> {
        let key = path::fold(name);
        self.children.iter().find(|c| path::fold(&c.name) == key)
    }

    /// Value by name, matched case-insensitively.
    pub fn value(&self, name: &str) -> Option<&SnapshotValue> {
        let key = path::fold(name);
        self.values.iter().find(|v| path::fold(&v.name) == key)
    }
}

/// Serialize a tree into a framed snapshot.
pub fn encode(root: &SnapshotNode) -> StoreResult<Vec<u8>> {
    let payload = bincode::serialize(root).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("snapshot exceeds 4 GiB".into()))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Verify and deserialize a framed snapshot.
pub fn decode(bytes: &[u8]) -> StoreResult<SnapshotNode> {
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Corrupt(format!(
            "file is {} bytes, shorter than the header",
            bytes.len()
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(StoreError::Corrupt("bad magic".into()));
    }

    let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let version = word(4);
    let length = word(8) as usize;
    let expected_crc = word(12);

    if version != FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!("unsupported version {version}")));
    }
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != length {
        return Err(StoreError::Corrupt(format!(
            "payload is {} bytes, header says {length}",
            payload.len()
        )));
    }
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(StoreError::Corrupt(format!(
            "CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"
        )));
    }

    bincode::deserialize(payload).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Write a snapshot file, replacing any previous one.
pub fn write_file(path: &Path, root: &SnapshotNode) -> StoreResult<()> {
    let bytes = encode(root)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path)?;
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read and verify a snapshot file.
pub fn read_file(path: &Path) -> StoreResult<SnapshotNode> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

fn temp_path(path: &Path) -> StoreResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        StoreError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("snapshot path has no file name: {}", path.display()),
        ))
    })?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SnapshotNode {
        let mut root = SnapshotNode::named("");
        let mut vendor = SnapshotNode::named("Vendor");
        vendor.values.push(SnapshotValue {
            name: "Path".into(),
            value_type: ValueType::String,
            data: vec![b'C', 0, b':', 0, 0, 0],
        });
        root.children.push(vendor);
        root
    }

    #[test]
    fn encode_decode() {
        let root = sample();
        let bytes = encode(&root).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(decode(&bytes).unwrap(), root);
    }

    #[test]
    fn value_type_is_persisted_as_its_code() {
        let value = SnapshotValue {
            name: String::new(),
            value_type: ValueType::Integer64,
            data: Vec::new(),
        };
        let bytes = bincode::serialize(&value).unwrap();
        // name length, type code, data length
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[8..12], &11u32.to_le_bytes());
        assert_eq!(bincode::deserialize::<SnapshotValue>(&bytes).unwrap(), value);

        let mut unknown = bytes.clone();
        unknown[8] = 5;
        assert!(bincode::deserialize::<SnapshotValue>(&unknown).is_err());
    }

    #[test]
    fn flipped_payload_byte_fails_crc() {
        let mut bytes = encode(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(msg) if msg.contains("CRC")));
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let bytes = encode(&sample()).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 2]),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(decode(&bytes[..6]), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn wrong_magic_is_corrupt() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("hive.db");

        write_file(&file, &SnapshotNode::named("")).unwrap();
        write_file(&file, &sample()).unwrap();

        assert_eq!(read_file(&file).unwrap(), sample());
        assert!(!dir.path().join("nested").join("hive.db.tmp").exists());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let root = sample();
        let vendor = root.child("VENDOR").unwrap();
        assert!(vendor.value("path").is_some());
        assert!(root.child("other").is_none());
    }
}
