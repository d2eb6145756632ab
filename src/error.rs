//! Error types for hostshield.

use thiserror::Error;

use crate::AdBlockMethod;

/// Error type for hostshield operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The blocking backend could not be started
    #[error("failed to start {0} blocking backend")]
    BackendStartFailed(AdBlockMethod),

    /// The blocking backend reported a failure while stopping
    #[error("failed to stop blocking backend: {0}")]
    BackendStopFailed(String),

    /// Transient rule store failure
    #[error("rule store unavailable: {0}")]
    RuleStoreUnavailable(String),

    /// Operation not supported by the active blocking method
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// Invalid rule line or host pattern
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// Unknown ad-block method name
    #[error("invalid ad-block method: {0}")]
    InvalidMethod(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON settings error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for hostshield operations.
pub type Result<T> = std::result::Result<T, Error>;
