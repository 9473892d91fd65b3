//! Error types and error codes for Scopegate
//!
//! This module defines:
//! - `ScopegateError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for admin responses

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum ScopegateError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("service '{0}' already registered")]
    AlreadyRegistered(String),

    #[error("service '{0}' not found")]
    ServiceNotFound(String),

    #[error("invalid service name '{0}'")]
    InvalidServiceName(String),

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScopegateError {
    /// Wrap a backend failure, keeping the whole cause chain in the message
    pub fn storage(err: anyhow::Error) -> Self {
        ScopegateError::Storage(format!("{err:#}"))
    }

    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            ScopegateError::Storage(_) => DATA_ACCESS_ERROR,
            ScopegateError::AlreadyRegistered(_) => SERVICE_ALREADY_EXIST,
            ScopegateError::ServiceNotFound(_) => SERVICE_NOT_EXIST,
            ScopegateError::InvalidServiceName(_) => SERVICE_NAME_ERROR,
            ScopegateError::InvalidScope(_) => ILLEGAL_SCOPE,
            ScopegateError::Config(_) => PARAMETER_VALIDATE_ERROR,
        }
    }
}

/// Error code structure for admin responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const SERVICE_NAME_ERROR: ErrorCode<'static> = ErrorCode {
    code: 21000,
    message: "service name error",
};

pub const SERVICE_ALREADY_EXIST: ErrorCode<'static> = ErrorCode {
    code: 21007,
    message: "service already exist",
};

pub const SERVICE_NOT_EXIST: ErrorCode<'static> = ErrorCode {
    code: 21008,
    message: "service not exist",
};

pub const ILLEGAL_SCOPE: ErrorCode<'static> = ErrorCode {
    code: 22000,
    message: "illegal scope",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};
