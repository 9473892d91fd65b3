//! Registry of service controls
//!
//! The registry is an explicit, process-scoped service locator: build one at
//! startup and hand it (usually behind an `Arc`) to the dispatch and admin
//! layers. Its lock only guards the map and is never held across a storage
//! call or a visitor callback.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use scopegate_common::{ScopegateError, is_valid_service_name};
use scopegate_persistence::ScopeStore;
use tracing::info;

use crate::control::{Control, ControlOptions};

/// Map from service name to its [`Control`]
pub struct ControlRegistry {
    store: Arc<dyn ScopeStore>,
    controls: RwLock<HashMap<String, Arc<Control>>>,
}

impl ControlRegistry {
    pub fn new(store: Arc<dyn ScopeStore>) -> Self {
        Self {
            store,
            controls: RwLock::new(HashMap::new()),
        }
    }

    /// Register a service and create its storage namespace.
    ///
    /// A storage failure here leaves the service without persistence and is
    /// meant to abort startup. Registering a name twice is rejected with
    /// [`ScopegateError::AlreadyRegistered`]; the first control stays in place.
    pub async fn register(
        &self,
        service: impl Into<String>,
        options: ControlOptions,
    ) -> Result<Arc<Control>, ScopegateError> {
        let service = service.into();
        if !is_valid_service_name(&service) {
            return Err(ScopegateError::InvalidServiceName(service));
        }
        if self.controls.read().contains_key(&service) {
            return Err(ScopegateError::AlreadyRegistered(service));
        }

        self.store
            .create_namespace(&service)
            .await
            .map_err(|e| ScopegateError::storage(e.context(format!("create namespace '{}'", service))))?;

        let control = Arc::new(Control::new(
            service.clone(),
            options,
            Arc::clone(&self.store),
        ));

        match self.controls.write().entry(service) {
            Entry::Occupied(entry) => Err(ScopegateError::AlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                info!(
                    service = entry.key().as_str(),
                    disable_on_default = control.options().disable_on_default,
                    "Service registered"
                );
                entry.insert(Arc::clone(&control));
                Ok(control)
            }
        }
    }

    pub fn lookup(&self, service: &str) -> Option<Arc<Control>> {
        self.controls.read().get(service).cloned()
    }

    /// Copy of the current entries, in arbitrary order
    pub fn snapshot(&self) -> Vec<(String, Arc<Control>)> {
        self.controls
            .read()
            .iter()
            .map(|(name, control)| (name.clone(), Arc::clone(control)))
            .collect()
    }

    /// Visit every registered control; returning `false` stops the walk.
    ///
    /// Visits a snapshot taken under the lock, so the visitor may call back
    /// into the registry (even `register`) without deadlocking.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &Arc<Control>) -> bool,
    {
        for (name, control) in self.snapshot() {
            if !visitor(&name, &control) {
                return;
            }
        }
    }

    /// Async flavour of [`for_each`](Self::for_each) for visitors that resolve state
    pub async fn for_each_async<F, Fut>(&self, mut visitor: F)
    where
        F: FnMut(String, Arc<Control>) -> Fut,
        Fut: Future<Output = bool>,
    {
        for (name, control) in self.snapshot() {
            if !visitor(name, control).await {
                return;
            }
        }
    }

    /// Registered service names, sorted
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.controls.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.controls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.read().is_empty()
    }
}

impl std::fmt::Debug for ControlRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlRegistry")
            .field("services", &self.service_names())
            .finish()
    }
}
