//! Harp core data model
//!
//! Scripts, resource declarations, and the dependency graph builder that
//! turns a flat declaration list into a deterministic execution order.

pub mod error;
pub mod graph;
pub mod script;

// Re-exports
pub use error::{CoreError, Result};
pub use graph::DependencyGraphBuilder;
pub use script::{AttributeValue, ResourceDeclaration, Script};
