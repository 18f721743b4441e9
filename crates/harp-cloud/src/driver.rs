//! Resource driver trait and registry
//!
//! A driver translates one resource kind into provider operations. Each
//! driver owns a one-directional alias table mapping declaration field
//! names to the provider's field names, keeping provider vocabulary out of
//! the engine.

use crate::context::Credentials;
use crate::error::{CloudError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Namespace for deterministic (v5) identifiers.
pub const HARP_NAMESPACE: Uuid = Uuid::from_bytes([
    0x9a, 0x1c, 0x5e, 0x11, 0x7b, 0x42, 0x4d, 0x0e, 0x8f, 0x23, 0xa6, 0x5d, 0x90, 0x3b, 0x71,
    0xce,
]);

/// Transport seam to a provider API. Implementations own the wire protocol;
/// drivers only name an operation and hand over provider-vocabulary params.
#[async_trait]
pub trait ProviderApi: Send + Sync {
    async fn call(
        &self,
        credentials: &Credentials,
        operation: &str,
        params: Value,
    ) -> Result<Value>;
}

/// Normalized result of a driver's create path
#[derive(Debug, Clone)]
pub struct DriverOutput {
    /// Provider-assigned identifier
    pub id: String,

    /// Captured provider response fields
    pub outputs: HashMap<String, Value>,
}

/// Outcome of a driver's destroy path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyStatus {
    Destroyed,
    /// The resource no longer exists at the provider. Teardown is
    /// idempotent, so this is a success.
    AlreadyGone,
}

/// Capability set a resource kind must provide
#[async_trait]
pub trait ResourceDriver: Send + Sync {
    /// Kind key this driver registers under (e.g. "Std::Vpc")
    fn kind(&self) -> &str;

    /// Prefix for synthesized identifiers (e.g. "vpc-")
    fn id_prefix(&self) -> &str;

    /// Translate a declaration field name to the provider's field name.
    fn alias(&self, field: &str) -> Option<&str>;

    async fn create(
        &self,
        api: &dyn ProviderApi,
        credentials: &Credentials,
        attributes: &HashMap<String, Value>,
    ) -> Result<DriverOutput>;

    async fn destroy(
        &self,
        api: &dyn ProviderApi,
        credentials: &Credentials,
        attributes: &HashMap<String, Value>,
    ) -> Result<DestroyStatus>;

    /// Opaque handle under which this node's output can later be retrieved.
    fn output_token(&self, node_name: &str, id: &str) -> String {
        let seed = format!("{}:{}:{}", self.kind(), node_name, id);
        Uuid::new_v5(&HARP_NAMESPACE, seed.as_bytes())
            .simple()
            .to_string()
    }
}

impl std::fmt::Debug for dyn ResourceDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDriver")
            .field("kind", &self.kind())
            .finish()
    }
}

/// Rewrite resolved attributes into provider vocabulary using the driver's
/// alias table. Fields without an alias pass through unchanged.
pub fn to_provider_params(
    driver: &dyn ResourceDriver,
    attributes: &HashMap<String, Value>,
) -> serde_json::Map<String, Value> {
    let mut params = serde_json::Map::new();
    for (field, value) in attributes {
        let key = driver.alias(field).unwrap_or(field.as_str());
        params.insert(key.to_string(), value.clone());
    }
    params
}

/// Dispatch table from kind tag to driver, populated once at process start.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn ResourceDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its kind key. Registering the same kind twice
    /// is a startup configuration error.
    pub fn register(&mut self, driver: Arc<dyn ResourceDriver>) -> Result<()> {
        let kind = driver.kind().to_string();
        if self.drivers.contains_key(&kind) {
            return Err(CloudError::DuplicateDriver(kind));
        }
        tracing::debug!(%kind, "Registered resource driver");
        self.drivers.insert(kind, driver);
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Result<&Arc<dyn ResourceDriver>> {
        self.drivers
            .get(kind)
            .ok_or_else(|| CloudError::UnsupportedKind(kind.to_string()))
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.drivers.keys().map(String::as_str).collect()
    }
}
