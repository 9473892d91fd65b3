//! Per-service toggle control
//!
//! A `Control` owns the enablement state of exactly one service. Resolution
//! order for a scope:
//!
//! 1. the global override row: if it disables the service, nothing else matters
//! 2. the row of the scope itself
//! 3. the default policy, which is then written back as an explicit row so the
//!    first resolution of a scope is sticky and visible to later listings

use std::sync::Arc;

use scopegate_persistence::{ScopeConfig, ScopeStore};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::gate::ControlGate;
use crate::scope::Scope;

/// Registration-time options of a service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlOptions {
    /// Resolve never-seen scopes as disabled instead of enabled
    #[serde(default)]
    pub disable_on_default: bool,
    /// Usage text shown by admin tooling
    #[serde(default)]
    pub help: String,
}

impl ControlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.disable_on_default = true;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// Toggle state and resolution for one service
pub struct Control {
    service: String,
    options: ControlOptions,
    store: Arc<dyn ScopeStore>,
    lock: RwLock<()>,
}

impl Control {
    /// Built by `ControlRegistry::register` once the namespace exists
    pub(crate) fn new(service: String, options: ControlOptions, store: Arc<dyn ScopeStore>) -> Self {
        Self {
            service,
            options,
            store,
            lock: RwLock::new(()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    /// Help text, `None` when the service registered without one
    pub fn help(&self) -> Option<&str> {
        Some(self.options.help.as_str()).filter(|h| !h.is_empty())
    }

    /// Enable the service in `scope`. `Scope::Global` only touches the global
    /// override row, never the per-scope rows.
    pub async fn enable(&self, scope: Scope) {
        self.set_disabled(scope, false).await;
    }

    /// Disable the service in `scope`. `Scope::Global` disables it everywhere
    /// until the global row is enabled again.
    pub async fn disable(&self, scope: Scope) {
        self.set_disabled(scope, true).await;
    }

    async fn set_disabled(&self, scope: Scope, disabled: bool) {
        let _guard = self.lock.write().await;
        self.write_row(scope, disabled).await;
    }

    /// Best effort: a failed write is logged and not retried. Callers hold the
    /// write guard.
    async fn write_row(&self, scope: Scope, disabled: bool) {
        let row = ScopeConfig::new(scope.storage_id(), disabled);
        match self.store.upsert(&self.service, row).await {
            Ok(()) => debug!(service = %self.service, %scope, disabled, "Scope state written"),
            Err(e) => error!(
                service = %self.service,
                %scope,
                disabled,
                "Failed to write scope state: {:#}",
                e
            ),
        }
    }

    /// Resolve whether the service is enabled in `scope`.
    ///
    /// Storage failures during lookup count as "no row", so a faulty store
    /// degrades to the default policy instead of surfacing an error.
    pub async fn is_enabled_in(&self, scope: Scope) -> bool {
        {
            let _guard = self.lock.read().await;

            if let Some(global) = self.find(Scope::Global).await {
                debug!(service = %self.service, disabled = global.disabled, "Global override");
                if global.is_disabled() {
                    return false;
                }
                if scope.is_global() {
                    return true;
                }
            }

            if !scope.is_global()
                && let Some(row) = self.find(scope).await
            {
                debug!(service = %self.service, %scope, disabled = row.disabled, "Scope state");
                return !row.is_disabled();
            }
        }

        let enabled = !self.options.disable_on_default;
        // Never materialize a default global row: a default-disabled service
        // would otherwise switch itself off everywhere.
        if scope.is_global() {
            return enabled;
        }

        self.apply_default(scope, enabled).await
    }

    /// Write the default for `scope` unless a row appeared since the read
    /// guard was released. An explicit enable/disable that won the write lock
    /// in between is kept and its value returned.
    async fn apply_default(&self, scope: Scope, enabled: bool) -> bool {
        let _guard = self.lock.write().await;

        if let Some(global) = self.find(Scope::Global).await
            && global.is_disabled()
        {
            return false;
        }
        if let Some(row) = self.find(scope).await {
            debug!(service = %self.service, %scope, disabled = row.disabled, "Scope state written concurrently");
            return !row.is_disabled();
        }

        debug!(service = %self.service, %scope, enabled, "Applying default policy");
        self.write_row(scope, !enabled).await;
        enabled
    }

    /// Explicit state of `scope` without applying the default policy:
    /// `Some(enabled)` when a row exists, `None` otherwise.
    pub async fn state_in(&self, scope: Scope) -> Option<bool> {
        let _guard = self.lock.read().await;
        self.find(scope).await.map(|row| !row.is_disabled())
    }

    /// All explicit rows of this service, ordered by storage id
    pub async fn rows(&self) -> anyhow::Result<Vec<(Scope, bool)>> {
        let _guard = self.lock.read().await;
        let rows = self.store.list(&self.service).await?;
        Ok(rows
            .into_iter()
            .map(|row| (Scope::from_storage_id(row.scope), !row.is_disabled()))
            .collect())
    }

    /// Gate predicate for a dispatch layer, see [`ControlGate`]
    pub fn handler(self: &Arc<Self>) -> ControlGate {
        ControlGate::new(Arc::clone(self))
    }

    async fn find(&self, scope: Scope) -> Option<ScopeConfig> {
        match self.store.find_one(&self.service, scope.storage_id()).await {
            Ok(row) => row,
            Err(e) => {
                error!(
                    service = %self.service,
                    %scope,
                    "Failed to read scope state: {:#}",
                    e
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("service", &self.service)
            .field("options", &self.options)
            .finish()
    }
}
