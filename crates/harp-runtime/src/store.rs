//! Execution and script persistence
//!
//! Storage is an abstract keyed store: executions and scripts are loaded
//! and saved as whole values, so a reader always observes a consistent
//! snapshot even while a writer holds the execution lease. The lease table
//! gives single-writer discipline per execution id; a second mutating
//! request fails fast instead of queuing.

use crate::error::{HarpError, Result};
use crate::execution::Execution;
use async_trait::async_trait;
use harp_core::Script;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Keyed store for execution state
#[async_trait]
pub trait ExecutionStateStore: Send + Sync {
    async fn load(&self, execution_id: &str) -> Result<Option<Execution>>;
    async fn save(&self, execution: &Execution) -> Result<()>;
    async fn remove(&self, execution_id: &str) -> Result<Option<Execution>>;
}

/// Keyed store for script content
#[async_trait]
pub trait ScriptStore: Send + Sync {
    async fn load_script(&self, script_id: &str) -> Result<Option<Script>>;
    async fn save_script(&self, script: &Script) -> Result<()>;
}

/// In-memory store backing both repositories
#[derive(Default)]
pub struct MemoryStateStore {
    executions: RwLock<HashMap<String, Execution>>,
    scripts: RwLock<HashMap<String, Script>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStateStore for MemoryStateStore {
    async fn load(&self, execution_id: &str) -> Result<Option<Execution>> {
        Ok(self.executions.read().await.get(execution_id).cloned())
    }

    async fn save(&self, execution: &Execution) -> Result<()> {
        self.executions
            .write()
            .await
            .insert(execution.execution_id.clone(), execution.clone());
        tracing::debug!(execution_id = %execution.execution_id, status = %execution.status, "Saved execution");
        Ok(())
    }

    async fn remove(&self, execution_id: &str) -> Result<Option<Execution>> {
        Ok(self.executions.write().await.remove(execution_id))
    }
}

#[async_trait]
impl ScriptStore for MemoryStateStore {
    async fn load_script(&self, script_id: &str) -> Result<Option<Script>> {
        Ok(self.scripts.read().await.get(script_id).cloned())
    }

    async fn save_script(&self, script: &Script) -> Result<()> {
        self.scripts
            .write()
            .await
            .insert(script.id.clone(), script.clone());
        Ok(())
    }
}

/// Per-execution single-writer leases
#[derive(Debug, Default)]
pub struct LeaseTable {
    held: Mutex<HashSet<String>>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for an execution id, or fail fast if another request
    /// already holds it. The lease is released when the guard drops.
    pub fn acquire(self: &Arc<Self>, execution_id: &str) -> Result<ExecutionLease> {
        let mut held = match self.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !held.insert(execution_id.to_string()) {
            return Err(HarpError::ConcurrentExecution(execution_id.to_string()));
        }
        tracing::debug!(%execution_id, "Acquired execution lease");
        Ok(ExecutionLease {
            table: Arc::clone(self),
            execution_id: execution_id.to_string(),
        })
    }
}

/// RAII guard for an execution lease
#[derive(Debug)]
pub struct ExecutionLease {
    table: Arc<LeaseTable>,
    execution_id: String,
}

impl Drop for ExecutionLease {
    fn drop(&mut self) {
        let mut held = match self.table.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        held.remove(&self.execution_id);
        tracing::debug!(execution_id = %self.execution_id, "Released execution lease");
    }
}
