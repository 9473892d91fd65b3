//! Scope store trait
//!
//! Defines the storage contract the toggle engine depends on: one namespace per
//! service, holding at most one `ScopeConfig` row per scope.

use async_trait::async_trait;

use crate::model::ScopeConfig;

/// Storage operations for per-service scope toggles
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Create the namespace for a service. Creating an existing namespace is a no-op.
    async fn create_namespace(&self, namespace: &str) -> anyhow::Result<()>;

    /// Insert or replace the row for `row.scope`
    async fn upsert(&self, namespace: &str, row: ScopeConfig) -> anyhow::Result<()>;

    /// Point lookup by scope identifier
    async fn find_one(&self, namespace: &str, scope: i64) -> anyhow::Result<Option<ScopeConfig>>;

    /// All rows of a namespace, ordered by scope identifier
    async fn list(&self, namespace: &str) -> anyhow::Result<Vec<ScopeConfig>>;
}
