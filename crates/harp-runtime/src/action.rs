//! Action log vocabulary
//!
//! Every engine segment emits an ordered list of action records. The
//! rendering layer and the debugger UI consume these verbatim, so the
//! serialized vocabulary is part of the external contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of an action-log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// A resource was created
    Create,
    /// A resource was mutated by a custom verb
    Update,
    /// A resource was destroyed
    Destroy,
    /// Execution suspended at a breakpoint or step boundary
    Break,
    /// Carries the resume token for the next step/continue call
    Token,
    /// Carries the execution identifier of a fresh execution
    HarpId,
    /// A retrievable node output, returned from an output-token query
    Output,
    /// The execution reached a terminal status
    End,
    /// A surfaced failure
    Error,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Destroy => write!(f, "destroy"),
            Action::Break => write!(f, "break"),
            Action::Token => write!(f, "token"),
            Action::HarpId => write!(f, "harp_id"),
            Action::Output => write!(f, "output"),
            Action::End => write!(f, "end"),
            Action::Error => write!(f, "error"),
        }
    }
}

/// One entry of the action log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,

    /// Action-specific payload
    pub payload: Value,

    /// Whether this entry was produced by a simulated provider call
    pub mock: bool,
}

impl ActionRecord {
    pub fn new(action: Action, payload: Value, mock: bool) -> Self {
        Self {
            action,
            payload,
            mock,
        }
    }
}

/// Strip quoting, backslashes and control characters from an error message
/// before it crosses the external boundary. Full detail stays in the
/// server-side logs.
pub fn sanitize_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| !matches!(c, '"' | '\\') && !c.is_control())
        .collect()
}
