//! Scopegate Control - per-service, per-scope toggles
//!
//! This crate provides:
//! - `Control`: enablement state and resolution for one service
//!   (global override, then scope row, then sticky default policy)
//! - `ControlRegistry`: service name to `Control` lookup and snapshot iteration
//! - `ControlGate`: the predicate a dispatch layer evaluates per event
//! - Admin operations behind enable/disable/usage/list commands

pub mod admin;
pub mod context;
pub mod control;
pub mod gate;
pub mod registry;
pub mod scope;

pub use admin::{AdminCommand, AdminOutcome, ServiceStatus, admin_permitted, execute};
pub use context::{Event, EventContext, SenderRole};
pub use control::{Control, ControlOptions};
pub use gate::{ControlGate, Rule, check_all};
pub use registry::ControlRegistry;
pub use scope::Scope;

pub use scopegate_common::ScopegateError;
