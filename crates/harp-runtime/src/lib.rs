//! Harp runtime
//!
//! The execution engine of the Harp orchestration runtime: executions and
//! their node tables, the action log, suspension checkpoints, the keyed
//! state store with its single-writer lease discipline, and the lifecycle
//! engine that walks a dependency-ordered script with breakpoint, step and
//! resume semantics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               external API layer             │
//! └──────────────────┬──────────────────────────┘
//!                    │ RequestContext per request
//! ┌──────────────────▼──────────────────────────┐
//! │            LifecycleEngine                   │
//! │  lease → load/create → walk → checkpoint     │
//! │          or terminal status → save           │
//! └───┬───────────────────────────────┬─────────┘
//!     │ per-node dispatch             │ persistence
//! ┌───▼──────────────┐   ┌────────────▼─────────┐
//! │   harp-cloud      │   │ ExecutionStateStore  │
//! │   CloudMutator    │   │ ScriptStore          │
//! └──────────────────┘   └──────────────────────┘
//! ```

pub mod action;
pub mod checkpoint;
pub mod engine;
pub mod error;
pub mod execution;
pub mod store;

// Re-exports
pub use action::{sanitize_message, Action, ActionRecord};
pub use checkpoint::Checkpoint;
pub use engine::{LifecycleEngine, VERB_CREATE, VERB_DESTROY};
pub use error::{HarpError, Result};
pub use execution::{Execution, ExecutionStatus, NodeState, ResourceNode};
pub use store::{ExecutionLease, ExecutionStateStore, LeaseTable, MemoryStateStore, ScriptStore};
