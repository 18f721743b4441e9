//! Execution model
//!
//! An execution ("play") is one run of a lifecycle verb against a script's
//! declarations. It carries the order computed at creation, per-node
//! runtime state, the accumulated action log, and, while suspended, a
//! checkpoint.

use crate::action::ActionRecord;
use crate::checkpoint::Checkpoint;
use chrono::{DateTime, Utc};
use harp_cloud::ProducedOutputs;
use harp_core::ResourceDeclaration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// State of a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Not yet processed
    Pending,
    /// Mutation dispatch in flight
    Running,
    /// Created (or mutated) successfully
    Succeeded,
    /// Mutation failed
    Failed,
    /// Not processed because an ancestor failed
    Skipped,
    /// Torn down successfully
    Destroyed,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Pending => write!(f, "pending"),
            NodeState::Running => write!(f, "running"),
            NodeState::Succeeded => write!(f, "succeeded"),
            NodeState::Failed => write!(f, "failed"),
            NodeState::Skipped => write!(f, "skipped"),
            NodeState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// One declaration plus its runtime state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    pub name: String,
    pub kind: String,
    pub state: NodeState,

    /// Provider-assigned identifier, set exactly once at successful creation
    pub id: Option<String>,

    /// Captured provider response fields
    pub outputs: HashMap<String, Value>,
}

impl ResourceNode {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            state: NodeState::Pending,
            id: None,
            outputs: HashMap::new(),
        }
    }

    /// Assign the provider id. A node's id is set exactly once; later
    /// assignments are ignored.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        if self.id.is_none() {
            self.id = Some(id.into());
        }
    }
}

/// Overall status of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Nodes remain to process
    Running,
    /// Parked at a checkpoint
    Suspended,
    /// All nodes Succeeded or Skipped, none Failed
    Succeeded,
    /// At least one node Failed
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Suspended => write!(f, "suspended"),
            ExecutionStatus::Succeeded => write!(f, "succeeded"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One run of a lifecycle verb against a script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: String,

    /// Script this execution was created from
    pub script_id: String,

    /// Lifecycle verb of the current segment
    pub verb: String,

    pub status: ExecutionStatus,

    /// Execution order computed once at creation, never recomputed
    pub node_order: Vec<String>,

    /// Node table keyed by declaration name
    pub nodes: HashMap<String, ResourceNode>,

    /// Suspension state while status is Suspended
    pub checkpoint: Option<Checkpoint>,

    /// Retrievable action records keyed by output token
    pub output_tokens: HashMap<String, ActionRecord>,

    /// Full accumulated action log
    pub log: Vec<ActionRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Execution {
    pub fn new(
        execution_id: impl Into<String>,
        script_id: impl Into<String>,
        verb: impl Into<String>,
        node_order: Vec<String>,
        declarations: &[ResourceDeclaration],
    ) -> Self {
        let nodes = declarations
            .iter()
            .map(|d| (d.name.clone(), ResourceNode::new(&d.name, &d.kind)))
            .collect();
        let now = Utc::now();
        Self {
            execution_id: execution_id.into(),
            script_id: script_id.into(),
            verb: verb.into(),
            status: ExecutionStatus::Running,
            node_order,
            nodes,
            checkpoint: None,
            output_tokens: HashMap::new(),
            log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn node(&self, name: &str) -> Option<&ResourceNode> {
        self.nodes.get(name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut ResourceNode> {
        self.updated_at = Utc::now();
        self.nodes.get_mut(name)
    }

    /// Append one record to the action log.
    pub fn record(&mut self, record: ActionRecord) {
        self.log.push(record);
        self.updated_at = Utc::now();
    }

    /// Outputs of all succeeded nodes, each including its id under `"id"`,
    /// in the shape the mutator resolves references against.
    pub fn produced_outputs(&self) -> ProducedOutputs {
        let mut produced = ProducedOutputs::new();
        for node in self.nodes.values() {
            if node.state != NodeState::Succeeded {
                continue;
            }
            let mut outputs = node.outputs.clone();
            if let Some(id) = &node.id {
                outputs.insert("id".to_string(), Value::String(id.clone()));
            }
            produced.insert(node.name.clone(), outputs);
        }
        produced
    }

    /// Settle the terminal status once every node has been processed.
    pub fn finish(&mut self) {
        let failed = self.nodes.values().any(|n| n.state == NodeState::Failed);
        self.status = if failed {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Succeeded
        };
        self.checkpoint = None;
        self.updated_at = Utc::now();
    }
}
