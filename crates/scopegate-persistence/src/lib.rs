//! Scopegate Persistence - Scope toggle storage
//!
//! This crate provides:
//! - The `ScopeStore` contract (create namespace, upsert, point lookup)
//! - `ScopeConfig`, the persisted (scope, disabled) row
//! - In-memory, JSON file and RocksDB (`embedded` feature) backends

#[cfg(feature = "embedded")]
pub mod embedded;
pub mod file;
pub mod memory;
pub mod model;
pub mod traits;

use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "embedded")]
pub use embedded::EmbeddedScopeStore;
pub use file::FileScopeStore;
pub use memory::MemoryScopeStore;
pub use model::{ScopeConfig, StorageType};
pub use traits::ScopeStore;

/// Create a scope store based on configuration
pub fn create_scope_store(
    storage_type: StorageType,
    path: impl AsRef<Path>,
) -> anyhow::Result<Arc<dyn ScopeStore>> {
    let path = path.as_ref();
    match storage_type {
        StorageType::Memory => Ok(Arc::new(MemoryScopeStore::new())),
        StorageType::File => Ok(Arc::new(FileScopeStore::new(path))),
        #[cfg(feature = "embedded")]
        StorageType::Embedded => Ok(Arc::new(EmbeddedScopeStore::open(path)?)),
        #[cfg(not(feature = "embedded"))]
        StorageType::Embedded => Err(anyhow::anyhow!(
            "embedded storage requires the 'embedded' feature"
        )),
    }
}
