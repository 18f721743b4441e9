//! Core error types

use thiserror::Error;

/// Errors raised while loading scripts or building the dependency graph
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Duplicate declaration name: {0}")]
    DuplicateName(String),

    #[error("Unknown reference: '{target}' referenced by declaration '{referenced_by}'")]
    UnknownReference { target: String, referenced_by: String },

    #[error("Cycle detected among declarations: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    #[error("Malformed reference expression: {0}")]
    MalformedReference(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
