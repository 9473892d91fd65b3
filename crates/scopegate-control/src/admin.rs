//! Administrative operations on registered services
//!
//! These are the state changes a chat command layer triggers (enable, disable,
//! usage, service list). Parsing the command text and rendering replies stay
//! with the caller.

use std::sync::Arc;

use scopegate_common::ScopegateError;
use serde::Serialize;

use crate::context::Event;
use crate::control::Control;
use crate::registry::ControlRegistry;
use crate::scope::Scope;

/// Whether the sender of `event` may run admin commands: group owners and
/// admins inside a group, anyone talking to the bot directly in private.
pub fn admin_permitted(event: &Event) -> bool {
    if event.is_group() {
        event.sender_role.is_admin()
    } else {
        event.to_me
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Enable { service: String, scope: Scope },
    Disable { service: String, scope: Scope },
    Usage { service: String },
    ListServices { scope: Scope },
}

impl AdminCommand {
    /// Scope an enable/disable command applies to: the global override for the
    /// "all" variants, otherwise the scope the command was sent from.
    pub fn scope_for(event: &Event, all: bool) -> Option<Scope> {
        if all {
            Some(Scope::Global)
        } else {
            Scope::for_event(event)
        }
    }

    pub fn service(&self) -> Option<&str> {
        match self {
            AdminCommand::Enable { service, .. }
            | AdminCommand::Disable { service, .. }
            | AdminCommand::Usage { service } => Some(service),
            AdminCommand::ListServices { .. } => None,
        }
    }
}

/// One line of a service listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub service: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    Enabled { service: String, scope: Scope },
    Disabled { service: String, scope: Scope },
    Usage { service: String, help: Option<String> },
    Services { scope: Scope, services: Vec<ServiceStatus> },
}

/// Run an admin command against the registry
pub async fn execute(
    registry: &ControlRegistry,
    command: AdminCommand,
) -> Result<AdminOutcome, ScopegateError> {
    match command {
        AdminCommand::Enable { service, scope } => {
            let control = lookup(registry, &service)?;
            control.enable(scope).await;
            Ok(AdminOutcome::Enabled { service, scope })
        }
        AdminCommand::Disable { service, scope } => {
            let control = lookup(registry, &service)?;
            control.disable(scope).await;
            Ok(AdminOutcome::Disabled { service, scope })
        }
        AdminCommand::Usage { service } => {
            let control = lookup(registry, &service)?;
            let help = control.help().map(str::to_string);
            Ok(AdminOutcome::Usage { service, help })
        }
        AdminCommand::ListServices { scope } => {
            let mut services = Vec::with_capacity(registry.len());
            for (service, control) in registry.snapshot() {
                let enabled = control.is_enabled_in(scope).await;
                services.push(ServiceStatus { service, enabled });
            }
            services.sort_by(|a, b| a.service.cmp(&b.service));
            Ok(AdminOutcome::Services { scope, services })
        }
    }
}

fn lookup(registry: &ControlRegistry, service: &str) -> Result<Arc<Control>, ScopegateError> {
    registry
        .lookup(service)
        .ok_or_else(|| ScopegateError::ServiceNotFound(service.to_string()))
}
