//! Runtime error types

use harp_cloud::CloudError;
use harp_core::CoreError;
use thiserror::Error;

/// Errors raised by the lifecycle engine and the state store
#[derive(Error, Debug)]
pub enum HarpError {
    #[error("Script error: {0}")]
    Script(#[from] CoreError),

    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),

    #[error("Execution '{0}' is locked by another request")]
    ConcurrentExecution(String),

    #[error("Stale or unknown resume token for execution '{0}'")]
    StaleCheckpoint(String),

    #[error("Execution '{0}' is not suspended")]
    NotSuspended(String),

    #[error("Unknown execution: {0}")]
    UnknownExecution(String),

    #[error("Unknown script: {0}")]
    UnknownScript(String),

    #[error("Unknown output token: {0}")]
    UnknownOutputToken(String),

    #[error("No declaration recorded for node '{0}'")]
    MissingDeclaration(String),

    #[error("Request carries neither script content nor a script reference")]
    MissingScript,

    #[error("A mutating request requires an execution id")]
    MissingExecutionId,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarpError>;
