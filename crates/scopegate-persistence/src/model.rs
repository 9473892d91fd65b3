//! Persisted data models

use serde::{Deserialize, Serialize};

/// One persisted toggle row of a service namespace.
///
/// `scope` is the storage-level identifier: `0` is the global override,
/// positive values are groups and negative values are individual users.
/// `disabled` is `0` or `1`; the latest write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub scope: i64,
    pub disabled: u8,
}

impl ScopeConfig {
    pub fn new(scope: i64, disabled: bool) -> Self {
        Self {
            scope,
            disabled: u8::from(disabled),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled != 0
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum StorageType {
    /// Process memory, lost on exit
    Memory,
    /// One JSON file per service namespace (default)
    #[default]
    File,
    /// RocksDB with one column family per service namespace
    Embedded,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Memory => "memory",
            StorageType::File => "file",
            StorageType::Embedded => "embedded",
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageType::Memory),
            "file" => Ok(StorageType::File),
            "embedded" | "rocksdb" => Ok(StorageType::Embedded),
            _ => Err(format!("Invalid storage type: {}", s)),
        }
    }
}
