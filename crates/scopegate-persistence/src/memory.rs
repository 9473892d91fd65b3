//! In-memory scope store

use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::ScopeConfig;
use crate::traits::ScopeStore;

/// In-memory scope store implementation
#[derive(Debug, Default)]
pub struct MemoryScopeStore {
    namespaces: DashMap<String, DashMap<i64, u8>>,
}

impl MemoryScopeStore {
    pub fn new() -> Self {
        Self {
            namespaces: DashMap::new(),
        }
    }
}

fn missing_namespace(namespace: &str) -> anyhow::Error {
    anyhow::anyhow!("namespace '{}' not found", namespace)
}

#[async_trait]
impl ScopeStore for MemoryScopeStore {
    async fn create_namespace(&self, namespace: &str) -> anyhow::Result<()> {
        self.namespaces.entry(namespace.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, namespace: &str, row: ScopeConfig) -> anyhow::Result<()> {
        let rows = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        rows.insert(row.scope, row.disabled);
        Ok(())
    }

    async fn find_one(&self, namespace: &str, scope: i64) -> anyhow::Result<Option<ScopeConfig>> {
        let rows = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        Ok(rows.get(&scope).map(|disabled| ScopeConfig {
            scope,
            disabled: *disabled,
        }))
    }

    async fn list(&self, namespace: &str) -> anyhow::Result<Vec<ScopeConfig>> {
        let rows = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| missing_namespace(namespace))?;
        let mut rows: Vec<_> = rows
            .iter()
            .map(|r| ScopeConfig {
                scope: *r.key(),
                disabled: *r.value(),
            })
            .collect();
        rows.sort_by_key(|r| r.scope);
        Ok(rows)
    }
}
