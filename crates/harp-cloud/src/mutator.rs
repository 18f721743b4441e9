//! Mutation dispatch
//!
//! `CloudMutator` resolves a declaration's attribute references against the
//! outputs of already-processed nodes, looks up the driver for the
//! declaration's kind, and normalizes the driver's response or failure.
//! In mock mode the driver's live paths are bypassed and identifiers are
//! synthesized deterministically from the execution id and node name.

use crate::context::RequestContext;
use crate::driver::{DestroyStatus, DriverRegistry, ProviderApi, HARP_NAMESPACE};
use crate::error::{CloudError, Result};
use harp_core::{AttributeValue, ResourceDeclaration};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Outputs captured so far, keyed by node name. Each node's map contains
/// the provider response fields plus its assigned id under `"id"`.
pub type ProducedOutputs = HashMap<String, HashMap<String, Value>>;

/// Normalized outcome of one create dispatch
#[derive(Debug, Clone)]
pub struct NodeResult {
    pub id: String,
    pub outputs: HashMap<String, Value>,
}

pub struct CloudMutator {
    registry: DriverRegistry,
    api: Option<Arc<dyn ProviderApi>>,
}

impl CloudMutator {
    pub fn new(registry: DriverRegistry) -> Self {
        Self {
            registry,
            api: None,
        }
    }

    pub fn with_api(mut self, api: Arc<dyn ProviderApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Substitute every reference in the declaration with the referenced
    /// node's already-produced output. Topological order guarantees the
    /// output exists; the error is a defensive check.
    pub fn resolve_attributes(
        declaration: &ResourceDeclaration,
        produced: &ProducedOutputs,
    ) -> Result<HashMap<String, Value>> {
        let mut resolved = HashMap::with_capacity(declaration.attributes.len());
        for (field, value) in &declaration.attributes {
            let concrete = match value {
                AttributeValue::Literal(v) => v.clone(),
                AttributeValue::Reference { target, attribute } => produced
                    .get(target)
                    .and_then(|outputs| outputs.get(attribute))
                    .cloned()
                    .ok_or_else(|| CloudError::UnresolvedOutput {
                        target: format!("{target}.{attribute}"),
                        referenced_by: declaration.name.clone(),
                    })?,
            };
            resolved.insert(field.clone(), concrete);
        }
        Ok(resolved)
    }

    /// Deterministic mock identifier for a node of this execution.
    fn mock_id(prefix: &str, execution_id: &str, node_name: &str) -> String {
        let seed = format!("{execution_id}:{node_name}");
        let digest = Uuid::new_v5(&HARP_NAMESPACE, seed.as_bytes())
            .simple()
            .to_string();
        format!("{prefix}{}", &digest[..12])
    }

    fn live_api(&self) -> Result<&dyn ProviderApi> {
        self.api.as_deref().ok_or(CloudError::NoConnection)
    }

    /// Create dispatch for one node.
    pub async fn create(
        &self,
        execution_id: &str,
        declaration: &ResourceDeclaration,
        produced: &ProducedOutputs,
        ctx: &RequestContext,
    ) -> Result<NodeResult> {
        let resolved = Self::resolve_attributes(declaration, produced)?;
        let driver = self.registry.get(&declaration.kind)?;

        if ctx.mock_mode {
            let id = Self::mock_id(driver.id_prefix(), execution_id, &declaration.name);
            tracing::debug!(node = %declaration.name, %id, "Mock create");
            return Ok(NodeResult {
                id,
                outputs: resolved,
            });
        }

        let api = self.live_api()?;
        tracing::info!(node = %declaration.name, kind = %declaration.kind, "Creating resource");
        let fut = driver.create(api, &ctx.credentials, &resolved);
        let output = match tokio::time::timeout(ctx.call_timeout, fut).await {
            Err(_) => {
                return Err(CloudError::Timeout {
                    kind: declaration.kind.clone(),
                    name: declaration.name.clone(),
                    seconds: ctx.call_timeout.as_secs(),
                });
            }
            Ok(Err(e @ CloudError::AuthenticationFailed(_))) => return Err(e),
            Ok(Err(e)) => {
                return Err(CloudError::ResourceOperation {
                    kind: declaration.kind.clone(),
                    name: declaration.name.clone(),
                    source: Box::new(e),
                });
            }
            Ok(Ok(output)) => output,
        };

        // The recorded outputs carry the resolved request attributes as well
        // as the provider's response fields; teardown rebuilds its call
        // parameters from them, and some kinds have no id of their own.
        let mut outputs = resolved;
        outputs.extend(output.outputs);
        Ok(NodeResult {
            id: output.id,
            outputs,
        })
    }

    /// Destroy dispatch for one node. Already-absent resources are a
    /// success; teardown is idempotent.
    pub async fn destroy(
        &self,
        declaration: &ResourceDeclaration,
        recorded_outputs: &HashMap<String, Value>,
        ctx: &RequestContext,
    ) -> Result<()> {
        let driver = self.registry.get(&declaration.kind)?;

        if ctx.mock_mode {
            tracing::debug!(node = %declaration.name, "Mock destroy");
            return Ok(());
        }

        let api = self.live_api()?;
        tracing::info!(node = %declaration.name, kind = %declaration.kind, "Destroying resource");
        let fut = driver.destroy(api, &ctx.credentials, recorded_outputs);
        match tokio::time::timeout(ctx.call_timeout, fut).await {
            Err(_) => Err(CloudError::Timeout {
                kind: declaration.kind.clone(),
                name: declaration.name.clone(),
                seconds: ctx.call_timeout.as_secs(),
            }),
            Ok(Err(e @ CloudError::AuthenticationFailed(_))) => Err(e),
            Ok(Err(e)) => Err(CloudError::ResourceOperation {
                kind: declaration.kind.clone(),
                name: declaration.name.clone(),
                source: Box::new(e),
            }),
            Ok(Ok(DestroyStatus::Destroyed)) => Ok(()),
            Ok(Ok(DestroyStatus::AlreadyGone)) => {
                tracing::debug!(node = %declaration.name, "Resource already gone");
                Ok(())
            }
        }
    }
}
