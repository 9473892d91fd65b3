//! File-based scope store
//!
//! Each namespace lives in `<dir>/<namespace>.json`. Rows are cached in memory
//! and the whole file is rewritten on every upsert.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use scopegate_common::is_valid_service_name;
use tokio::sync::Mutex;

use crate::model::ScopeConfig;
use crate::traits::ScopeStore;

/// File-based scope store implementation
pub struct FileScopeStore {
    dir: PathBuf,
    namespaces: DashMap<String, BTreeMap<i64, u8>>,
    /// Serializes cache update and file write so files never go backwards
    write_lock: Mutex<()>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct FileStoreData {
    rows: Vec<ScopeConfig>,
}

impl FileScopeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            namespaces: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", namespace))
    }

    async fn load_from_file(&self, path: &Path) -> anyhow::Result<BTreeMap<i64, u8>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let data: FileStoreData = serde_json::from_str(&content)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(data
            .rows
            .into_iter()
            .map(|row| (row.scope, row.disabled))
            .collect())
    }

    async fn save_to_file(&self, namespace: &str, rows: &BTreeMap<i64, u8>) -> anyhow::Result<()> {
        let data = FileStoreData {
            rows: rows
                .iter()
                .map(|(scope, disabled)| ScopeConfig {
                    scope: *scope,
                    disabled: *disabled,
                })
                .collect(),
        };
        let content = serde_json::to_string_pretty(&data)?;

        let path = self.namespace_path(namespace);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("rename {} to {}", tmp.display(), path.display()))?;
        Ok(())
    }
}

fn missing_namespace(namespace: &str) -> anyhow::Error {
    anyhow::anyhow!("namespace '{}' not found", namespace)
}

#[async_trait]
impl ScopeStore for FileScopeStore {
    async fn create_namespace(&self, namespace: &str) -> anyhow::Result<()> {
        if !is_valid_service_name(namespace) {
            anyhow::bail!("invalid namespace name '{}'", namespace);
        }

        let _guard = self.write_lock.lock().await;
        if self.namespaces.contains_key(namespace) {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create data directory {}", self.dir.display()))?;

        let path = self.namespace_path(namespace);
        let rows = if tokio::fs::try_exists(&path).await? {
            let rows = self.load_from_file(&path).await?;
            tracing::debug!(namespace, rows = rows.len(), "Loaded scope namespace");
            rows
        } else {
            let rows = BTreeMap::new();
            self.save_to_file(namespace, &rows).await?;
            rows
        };

        self.namespaces.insert(namespace.to_string(), rows);
        Ok(())
    }

    async fn upsert(&self, namespace: &str, row: ScopeConfig) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let snapshot = {
            let mut rows = self
                .namespaces
                .get_mut(namespace)
                .ok_or_else(|| missing_namespace(namespace))?;
            rows.insert(row.scope, row.disabled);
            rows.clone()
        };
        self.save_to_file(namespace, &snapshot).await
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
        Ok(rows
            .iter()
            .map(|(scope, disabled)| ScopeConfig {
                scope: *scope,
                disabled: *disabled,
            })
            .collect())
    }
}
