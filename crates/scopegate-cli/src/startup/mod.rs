//! Application startup: logging and the control registry

mod logging;

use anyhow::Context;
use scopegate_control::ControlRegistry;
use scopegate_persistence::create_scope_store;
use tracing::info;

use crate::config::Configuration;

pub use logging::{LOG_FILE_NAME, LogRotation, LoggingConfig, LoggingGuard, init_logging};

/// Open the configured store and register every configured service.
///
/// Any failure here is fatal: a service that cannot create its namespace
/// would run without persistence.
pub async fn build_registry(configuration: &Configuration) -> anyhow::Result<ControlRegistry> {
    let storage_type = configuration.storage_type()?;
    let storage_path = configuration.storage_path();
    info!(
        storage = %storage_type,
        path = %storage_path.display(),
        "Opening scope store"
    );

    let store = create_scope_store(storage_type, &storage_path)
        .with_context(|| format!("Failed to open {} store at {}", storage_type, storage_path.display()))?;
    let registry = ControlRegistry::new(store);

    for service in configuration.services()? {
        registry
            .register(service.name.clone(), service.options())
            .await
            .with_context(|| format!("Failed to register service '{}'", service.name))?;
    }

    info!(services = registry.len(), "Control registry ready");
    Ok(registry)
}
