//! Store limits, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Bounds enforced by the reference store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Longest node or value name accepted, in UTF-16 code units.
    pub max_name_len: usize,
    /// Largest value payload accepted, in bytes.
    pub max_value_size: usize,
    /// Deepest node accepted, counting the root as depth 0.
    pub max_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_name_len: 255,
            max_value_size: 1024 * 1024, // 1 MiB
            max_depth: 512,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = StoreConfig::from_toml_str("max_value_size = 64\n").unwrap();
        assert_eq!(config.max_value_size, 64);
        assert_eq!(config.max_name_len, 255);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let err = StoreConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hive.toml");
        std::fs::write(&path, "max_name_len = 16\nmax_depth = 4\n").unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.max_name_len, 16);
        assert_eq!(config.max_depth, 4);
    }
}
