//! Scopegate Common - Shared types, errors, and utilities
//!
//! This crate provides the foundational pieces used across all Scopegate components:
//! - Error type and error codes
//! - Service name validation
//! - Common constants

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, ScopegateError};
pub use utils::is_valid_service_name;

/// Storage identifier reserved for the global override row of a service
pub const GLOBAL_SCOPE_ID: i64 = 0;

/// Key under which a gate records its owning control in the event state
pub const MANAGER_STATE_KEY: &str = "manager";

/// Default directory for persisted toggle state
pub const DEFAULT_DATA_DIR: &str = "data/control";
