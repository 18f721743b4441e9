//! Cloud driver and dispatch error types

use thiserror::Error;

/// Errors raised by the driver registry and mutation dispatch
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Unsupported resource kind: {0}")]
    UnsupportedKind(String),

    #[error("Driver already registered for kind: {0}")]
    DuplicateDriver(String),

    #[error("Output of '{target}' not yet produced, referenced by '{referenced_by}'")]
    UnresolvedOutput { target: String, referenced_by: String },

    #[error("No provider connection configured for live dispatch")]
    NoConnection,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Resource operation failed for {kind} '{name}': {source}")]
    ResourceOperation {
        kind: String,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Provider call timed out after {seconds}s for {kind} '{name}'")]
    Timeout { kind: String, name: String, seconds: u64 },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
