//! Request context and credentials
//!
//! The API layer constructs one `RequestContext` per request and passes it
//! by reference into the engine and the mutator. There is no ambient
//! process-wide credential lookup; named profiles are resolved once at
//! startup into a `CredentialProfiles` value.

use harp_core::ResourceDeclaration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default bound on any single live provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Access/secret credential pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub access: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(access: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            secret: secret.into(),
        }
    }
}

/// Named credential profiles, loaded once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialProfiles {
    profiles: HashMap<String, Credentials>,
}

impl CredentialProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, credentials: Credentials) {
        self.profiles.insert(name.into(), credentials);
    }

    pub fn get(&self, name: &str) -> Option<&Credentials> {
        self.profiles.get(name)
    }
}

/// Provider family the request targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    #[default]
    Aws,
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderFamily::Aws => write!(f, "aws"),
        }
    }
}

/// Resume mode for a suspended execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    /// Run to the next breakpoint or to completion
    Continue,
    /// Run exactly one node, then re-suspend
    Step,
}

/// Everything the core consumes from one external request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub credentials: Credentials,
    pub provider_family: ProviderFamily,

    /// Bypass live provider calls; synthesize deterministic results
    pub mock_mode: bool,

    /// Absent means a new execution is created
    pub execution_id: Option<String>,

    /// Parsed script content supplied with the request
    pub declarations: Option<Vec<ResourceDeclaration>>,

    /// Reference to previously stored script content
    pub script_id: Option<String>,

    /// Arm a breakpoint at this source line
    pub breakpoint_line: Option<u32>,

    /// Resume token from a prior `token` action record
    pub resume_token: Option<String>,

    /// Walk mode for this segment: run to the next stop, or a single node.
    /// Honoured on fresh runs as well as resumes.
    pub resume_mode: ResumeMode,

    /// Bound on each live provider call
    pub call_timeout: Duration,
}

impl RequestContext {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            provider_family: ProviderFamily::default(),
            mock_mode: false,
            execution_id: None,
            declarations: None,
            script_id: None,
            breakpoint_line: None,
            resume_token: None,
            resume_mode: ResumeMode::Continue,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn mock(mut self) -> Self {
        self.mock_mode = true;
        self
    }

    pub fn with_declarations(mut self, declarations: Vec<ResourceDeclaration>) -> Self {
        self.declarations = Some(declarations);
        self
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    pub fn with_breakpoint(mut self, line: u32) -> Self {
        self.breakpoint_line = Some(line);
        self
    }

    pub fn resuming(mut self, token: impl Into<String>, mode: ResumeMode) -> Self {
        self.resume_token = Some(token.into());
        self.resume_mode = mode;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}
