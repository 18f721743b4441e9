mod common;

use async_trait::async_trait;
use common::*;
use harp_cloud::{
    CloudMutator, Credentials, DestroyStatus, DriverOutput, DriverRegistry, ProviderApi,
    ResourceDriver,
};
use harp_core::ResourceDeclaration;
use harp_runtime::{ExecutionStatus, HarpError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Instant create, slow destroy. The slow teardown keeps the execution
/// lease held long enough for a competing request to arrive.
struct SlowTeardownDriver;

#[async_trait]
impl ResourceDriver for SlowTeardownDriver {
    fn kind(&self) -> &str {
        "Std::Vpc"
    }

    fn id_prefix(&self) -> &str {
        "vpc-"
    }

    fn alias(&self, _field: &str) -> Option<&str> {
        None
    }

    async fn create(
        &self,
        _api: &dyn ProviderApi,
        _credentials: &Credentials,
        _attributes: &HashMap<String, Value>,
    ) -> harp_cloud::Result<DriverOutput> {
        Ok(DriverOutput {
            id: "vpc-live".to_string(),
            outputs: HashMap::new(),
        })
    }

    async fn destroy(
        &self,
        _api: &dyn ProviderApi,
        _credentials: &Credentials,
        _attributes: &HashMap<String, Value>,
    ) -> harp_cloud::Result<DestroyStatus> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(DestroyStatus::Destroyed)
    }
}

struct NoopApi;

#[async_trait]
impl ProviderApi for NoopApi {
    async fn call(
        &self,
        _credentials: &Credentials,
        _operation: &str,
        _params: Value,
    ) -> harp_cloud::Result<Value> {
        Ok(Value::Null)
    }
}

#[tokio::test]
async fn second_mutating_request_fails_fast_while_lease_is_held() {
    let mut registry = DriverRegistry::new();
    registry.register(Arc::new(SlowTeardownDriver)).unwrap();
    let mutator = CloudMutator::new(registry).with_api(Arc::new(NoopApi));
    let (engine, _store) = engine_with(mutator);

    let decls = vec![ResourceDeclaration::new("v", "Std::Vpc")];
    let records = engine
        .play("create", &ctx().with_declarations(decls))
        .await
        .unwrap();
    let id = execution_id(&records);

    let slow_engine = engine.clone();
    let slow_id = id.clone();
    let teardown = tokio::spawn(async move {
        slow_engine
            .play("destroy", &ctx().with_execution_id(slow_id))
            .await
    });

    // Let the teardown take the lease, then collide with it.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let err = engine
        .play("destroy", &ctx().with_execution_id(id.as_str()))
        .await
        .unwrap_err();
    assert!(matches!(err, HarpError::ConcurrentExecution(_)));

    // Status queries do not need the lease.
    engine.status(&id).await.unwrap();

    teardown.await.unwrap().unwrap();
    let execution = engine.status(&id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Succeeded);

    // With the lease released, a retry goes through (idempotent teardown).
    engine
        .play("destroy", &ctx().with_execution_id(id.as_str()))
        .await
        .unwrap();
}

#[tokio::test]
async fn independent_executions_do_not_contend() {
    let (engine, _store) = mock_engine();

    let first = engine
        .play("create", &ctx().mock().with_declarations(scenario()))
        .await
        .unwrap();
    let second = engine
        .play("create", &ctx().mock().with_declarations(scenario()))
        .await
        .unwrap();
    assert_ne!(execution_id(&first), execution_id(&second));

    for records in [&first, &second] {
        let execution = engine.status(&execution_id(records)).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Succeeded);
    }
}
