//! Lifecycle engine
//!
//! The interpreter that walks an execution's stored node order, applies a
//! lifecycle verb to each node through the `CloudMutator`, and implements
//! breakpoint, single-step and resume on top of persisted checkpoints.
//! Every request segment acquires the execution lease, runs to the next
//! stop (checkpoint or terminal status), persists the execution, and
//! returns the action records emitted in that segment.

use crate::action::{sanitize_message, Action, ActionRecord};
use crate::checkpoint::Checkpoint;
use crate::error::{HarpError, Result};
use crate::execution::{Execution, ExecutionStatus, NodeState};
use crate::store::{ExecutionStateStore, LeaseTable, ScriptStore};
use harp_cloud::{CloudMutator, RequestContext, ResumeMode};
use harp_core::{DependencyGraphBuilder, Script};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const VERB_CREATE: &str = "create";
pub const VERB_DESTROY: &str = "destroy";

/// Walk parameters for one request segment
struct Segment {
    cursor: usize,
    breakpoint: Option<u32>,
    /// True when the segment starts parked on the breakpoint node itself,
    /// so the armed breakpoint does not immediately re-trigger
    honoured: bool,
    step: bool,
}

pub struct LifecycleEngine {
    mutator: CloudMutator,
    store: Arc<dyn ExecutionStateStore>,
    scripts: Arc<dyn ScriptStore>,
    leases: Arc<LeaseTable>,
}

impl LifecycleEngine {
    pub fn new(
        mutator: CloudMutator,
        store: Arc<dyn ExecutionStateStore>,
        scripts: Arc<dyn ScriptStore>,
    ) -> Self {
        Self {
            mutator,
            store,
            scripts,
            leases: Arc::new(LeaseTable::new()),
        }
    }

    /// Apply a lifecycle verb on behalf of one request. Returns the action
    /// records emitted by this segment.
    pub async fn play(&self, verb: &str, ctx: &RequestContext) -> Result<Vec<ActionRecord>> {
        match verb {
            VERB_DESTROY => self.destroy(ctx).await,
            _ if ctx.execution_id.is_some() => self.resume(ctx).await,
            _ => self.start(verb, ctx).await,
        }
    }

    /// Consistent snapshot of an execution, for status queries. Does not
    /// take the execution lease.
    pub async fn status(&self, execution_id: &str) -> Result<Execution> {
        self.store
            .load(execution_id)
            .await?
            .ok_or_else(|| HarpError::UnknownExecution(execution_id.to_string()))
    }

    /// Retrieve the action record behind an output token.
    pub async fn output(&self, execution_id: &str, token: &str) -> Result<ActionRecord> {
        let execution = self.status(execution_id).await?;
        execution
            .output_tokens
            .get(token)
            .cloned()
            .ok_or_else(|| HarpError::UnknownOutputToken(token.to_string()))
    }

    /// First invocation of a create-style verb: build the order, persist
    /// the script, emit `harp_id`, and walk from the top.
    async fn start(&self, verb: &str, ctx: &RequestContext) -> Result<Vec<ActionRecord>> {
        let script = self.resolve_script(ctx).await?;
        // Graph errors abort before any state is persisted.
        let order = DependencyGraphBuilder::new(&script.declarations).build()?;
        if ctx.declarations.is_some() {
            self.scripts.save_script(&script).await?;
        }

        let execution_id = Uuid::new_v4().to_string();
        let _lease = self.leases.acquire(&execution_id)?;
        tracing::info!(%execution_id, verb, nodes = order.len(), "Starting execution");

        let mut execution = Execution::new(
            &execution_id,
            &script.id,
            verb,
            order,
            &script.declarations,
        );
        execution.record(ActionRecord::new(
            Action::HarpId,
            json!({ "harp_id": execution_id }),
            ctx.mock_mode,
        ));

        let segment = Segment {
            cursor: 0,
            breakpoint: ctx.breakpoint_line,
            honoured: false,
            step: ctx.resume_mode == ResumeMode::Step,
        };
        self.walk(&mut execution, &script, segment, ctx).await?;
        self.store.save(&execution).await?;
        Ok(execution.log.clone())
    }

    /// Re-enter a suspended execution with a resume token.
    async fn resume(&self, ctx: &RequestContext) -> Result<Vec<ActionRecord>> {
        let execution_id = ctx
            .execution_id
            .as_deref()
            .ok_or(HarpError::MissingExecutionId)?;
        let _lease = self.leases.acquire(execution_id)?;

        let mut execution = self
            .store
            .load(execution_id)
            .await?
            .ok_or_else(|| HarpError::UnknownExecution(execution_id.to_string()))?;

        let checkpoint = match (execution.status, &execution.checkpoint) {
            (ExecutionStatus::Suspended, Some(checkpoint)) => checkpoint.clone(),
            _ => return Err(HarpError::NotSuspended(execution_id.to_string())),
        };
        let token = ctx
            .resume_token
            .as_deref()
            .ok_or_else(|| HarpError::StaleCheckpoint(execution_id.to_string()))?;
        if token != checkpoint.resume_token {
            // Stale tokens must not mutate state; nothing has been touched.
            return Err(HarpError::StaleCheckpoint(execution_id.to_string()));
        }

        // Token consumed; a fresh one is issued if the walk suspends again.
        execution.checkpoint = None;
        execution.status = ExecutionStatus::Running;

        let script = self
            .scripts
            .load_script(&execution.script_id)
            .await?
            .ok_or_else(|| HarpError::UnknownScript(execution.script_id.clone()))?;

        let breakpoint = ctx.breakpoint_line.or(checkpoint.breakpoint);
        // The cursor node is the one we parked on; an armed breakpoint
        // there has already been honoured for this segment.
        let honoured = execution
            .node_order
            .get(checkpoint.cursor)
            .and_then(|name| script.get(name))
            .is_some_and(|decl| breakpoint.is_some() && decl.source_line == breakpoint);

        tracing::info!(%execution_id, cursor = checkpoint.cursor, mode = ?ctx.resume_mode, "Resuming execution");
        let segment = Segment {
            cursor: checkpoint.cursor,
            breakpoint,
            honoured,
            step: ctx.resume_mode == ResumeMode::Step,
        };
        self.walk(&mut execution, &script, segment, ctx).await?;
        self.store.save(&execution).await?;
        Ok(execution.log[checkpoint.log_watermark..].to_vec())
    }

    /// Create-style walk over the stored order from the segment cursor.
    async fn walk(
        &self,
        execution: &mut Execution,
        script: &Script,
        segment: Segment,
        ctx: &RequestContext,
    ) -> Result<()> {
        let mut honoured = segment.honoured;
        let mut cursor = segment.cursor;
        let total = execution.node_order.len();

        while cursor < total {
            let name = execution.node_order[cursor].clone();
            let decl = script
                .get(&name)
                .ok_or_else(|| HarpError::MissingDeclaration(name.clone()))?;

            if let Some(line) = segment.breakpoint {
                if !honoured && decl.source_line == Some(line) {
                    self.suspend(execution, script, cursor, segment.breakpoint, ctx);
                    return Ok(());
                }
            }
            honoured = false;

            let state = execution
                .node(&name)
                .map(|n| n.state)
                .ok_or_else(|| HarpError::MissingDeclaration(name.clone()))?;
            if state == NodeState::Pending {
                self.run_node(execution, script, &name, ctx).await?;
            }

            if segment.step && cursor + 1 < total {
                self.suspend(execution, script, cursor + 1, segment.breakpoint, ctx);
                return Ok(());
            }
            cursor += 1;
        }

        execution.finish();
        execution.record(ActionRecord::new(
            Action::End,
            json!({ "status": execution.status }),
            ctx.mock_mode,
        ));
        tracing::info!(execution_id = %execution.execution_id, status = %execution.status, "Execution finished");
        Ok(())
    }

    /// Dispatch one pending node. Failures are isolated: the node and its
    /// not-yet-run descendants are marked, siblings keep running.
    async fn run_node(
        &self,
        execution: &mut Execution,
        script: &Script,
        name: &str,
        ctx: &RequestContext,
    ) -> Result<()> {
        let decl = script
            .get(name)
            .ok_or_else(|| HarpError::MissingDeclaration(name.to_string()))?;
        execution
            .node_mut(name)
            .ok_or_else(|| HarpError::MissingDeclaration(name.to_string()))?
            .state = NodeState::Running;

        let produced = execution.produced_outputs();
        let execution_id = execution.execution_id.clone();
        match self.mutator.create(&execution_id, decl, &produced, ctx).await {
            Ok(result) => {
                let token = self
                    .mutator
                    .registry()
                    .get(&decl.kind)?
                    .output_token(name, &result.id);

                let node = execution
                    .node_mut(name)
                    .ok_or_else(|| HarpError::MissingDeclaration(name.to_string()))?;
                node.assign_id(result.id.clone());
                node.outputs = result.outputs.clone();
                node.state = NodeState::Succeeded;

                let action = if execution.verb == VERB_CREATE {
                    Action::Create
                } else {
                    Action::Update
                };
                execution.output_tokens.insert(
                    token.clone(),
                    ActionRecord::new(
                        Action::Output,
                        json!({ "name": name, "id": result.id, "outputs": result.outputs }),
                        ctx.mock_mode,
                    ),
                );
                execution.record(ActionRecord::new(
                    action,
                    json!({
                        "name": name,
                        "kind": decl.kind,
                        "id": result.id,
                        "outputs": result.outputs,
                        "output_token": token,
                    }),
                    ctx.mock_mode,
                ));
                tracing::info!(node = name, id = %result.id, "Node succeeded");
            }
            Err(e) => {
                tracing::error!(node = name, error = %e, "Node failed");
                execution
                    .node_mut(name)
                    .ok_or_else(|| HarpError::MissingDeclaration(name.to_string()))?
                    .state = NodeState::Failed;
                execution.record(ActionRecord::new(
                    Action::Error,
                    json!({ "name": name, "message": sanitize_message(&e.to_string()) }),
                    ctx.mock_mode,
                ));
                Self::skip_descendants(execution, script, name);
            }
        }
        Ok(())
    }

    /// Mark every not-yet-run node that transitively depends on `failed`
    /// as Skipped. Independent subgraphs are untouched.
    fn skip_descendants(execution: &mut Execution, script: &Script, failed: &str) {
        let mut frontier = vec![failed.to_string()];
        while let Some(current) = frontier.pop() {
            for decl in &script.declarations {
                if !decl.references().contains(&current.as_str()) {
                    continue;
                }
                if let Some(node) = execution.node_mut(&decl.name) {
                    if node.state == NodeState::Pending {
                        node.state = NodeState::Skipped;
                        tracing::debug!(node = %decl.name, ancestor = failed, "Skipping descendant");
                        frontier.push(decl.name.clone());
                    }
                }
            }
        }
    }

    /// Park the execution at `cursor` with a fresh single-use resume token.
    fn suspend(
        &self,
        execution: &mut Execution,
        script: &Script,
        cursor: usize,
        breakpoint: Option<u32>,
        ctx: &RequestContext,
    ) {
        let mut checkpoint = Checkpoint::new(cursor, breakpoint, 0);
        let next = execution.node_order[cursor].clone();
        let line = script.get(&next).and_then(|d| d.source_line);

        execution.record(ActionRecord::new(
            Action::Break,
            json!({ "at": next, "line": line }),
            ctx.mock_mode,
        ));
        execution.record(ActionRecord::new(
            Action::Token,
            json!({ "resume_token": checkpoint.resume_token }),
            ctx.mock_mode,
        ));
        checkpoint.log_watermark = execution.log.len();
        tracing::info!(execution_id = %execution.execution_id, cursor, "Suspending at checkpoint");
        execution.status = ExecutionStatus::Suspended;
        execution.checkpoint = Some(checkpoint);
    }

    /// Tear down in the exact reverse of the recorded create order. Only
    /// nodes that succeeded have anything to destroy; teardown of an
    /// already-absent resource is a success.
    async fn destroy(&self, ctx: &RequestContext) -> Result<Vec<ActionRecord>> {
        let execution_id = ctx
            .execution_id
            .as_deref()
            .ok_or(HarpError::MissingExecutionId)?;
        let _lease = self.leases.acquire(execution_id)?;

        let mut execution = self
            .store
            .load(execution_id)
            .await?
            .ok_or_else(|| HarpError::UnknownExecution(execution_id.to_string()))?;
        let script = self
            .scripts
            .load_script(&execution.script_id)
            .await?
            .ok_or_else(|| HarpError::UnknownScript(execution.script_id.clone()))?;

        tracing::info!(%execution_id, "Starting teardown");
        let segment_start = execution.log.len();
        execution.verb = VERB_DESTROY.to_string();
        execution.status = ExecutionStatus::Running;
        // Abandon any pending create segment; teardown supersedes it.
        execution.checkpoint = None;

        let mut failed = false;
        for name in execution.node_order.clone().into_iter().rev() {
            let Some(node) = execution.node(&name) else {
                continue;
            };
            if node.state != NodeState::Succeeded {
                continue;
            }
            let decl = script
                .get(&name)
                .ok_or_else(|| HarpError::MissingDeclaration(name.clone()))?;

            let mut recorded = node.outputs.clone();
            if let Some(id) = &node.id {
                recorded.insert("id".to_string(), serde_json::Value::String(id.clone()));
            }
            let id = node.id.clone();

            match self.mutator.destroy(decl, &recorded, ctx).await {
                Ok(()) => {
                    if let Some(node) = execution.node_mut(&name) {
                        node.state = NodeState::Destroyed;
                    }
                    execution.record(ActionRecord::new(
                        Action::Destroy,
                        json!({ "name": name, "kind": decl.kind, "id": id }),
                        ctx.mock_mode,
                    ));
                    tracing::info!(node = %name, "Node destroyed");
                }
                Err(e) => {
                    tracing::error!(node = %name, error = %e, "Teardown failed");
                    failed = true;
                    if let Some(node) = execution.node_mut(&name) {
                        node.state = NodeState::Failed;
                    }
                    execution.record(ActionRecord::new(
                        Action::Error,
                        json!({ "name": name, "message": sanitize_message(&e.to_string()) }),
                        ctx.mock_mode,
                    ));
                }
            }
        }

        execution.status = if failed {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Succeeded
        };
        execution.record(ActionRecord::new(
            Action::End,
            json!({ "status": execution.status }),
            ctx.mock_mode,
        ));
        self.store.save(&execution).await?;
        Ok(execution.log[segment_start..].to_vec())
    }

    /// Script content for a fresh execution: either declarations supplied
    /// with the request (persisted by the caller for later destroy/status
    /// calls) or a reference to previously stored content.
    async fn resolve_script(&self, ctx: &RequestContext) -> Result<Script> {
        if let Some(declarations) = &ctx.declarations {
            let script_id = ctx
                .script_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            return Ok(Script::new(script_id, "1", declarations.clone())?);
        }
        let script_id = ctx.script_id.as_deref().ok_or(HarpError::MissingScript)?;
        self.scripts
            .load_script(script_id)
            .await?
            .ok_or_else(|| HarpError::UnknownScript(script_id.to_string()))
    }
}
