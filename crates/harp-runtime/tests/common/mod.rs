use harp_cloud::{CloudMutator, Credentials, RequestContext};
use harp_cloud_aws::standard_registry;
use harp_core::{AttributeValue, ResourceDeclaration};
use harp_runtime::{Action, ActionRecord, LifecycleEngine, MemoryStateStore};
use std::sync::Arc;

/// The V/G/A fixture: a vpc, a gateway, and an attachment referencing both.
pub fn scenario() -> Vec<ResourceDeclaration> {
    vec![
        ResourceDeclaration::new("v", "Std::Vpc")
            .with_attribute("cidr_block", AttributeValue::literal("10.0.0.0/16"))
            .at_line(1),
        ResourceDeclaration::new("g", "Std::InternetGateway").at_line(2),
        ResourceDeclaration::new("a", "Std::VpcGatewayAttachment")
            .with_attribute("vpc_id", AttributeValue::reference("v", "id"))
            .with_attribute("internet_gateway_id", AttributeValue::reference("g", "id"))
            .at_line(3),
    ]
}

#[allow(dead_code)]
pub fn engine_with(mutator: CloudMutator) -> (Arc<LifecycleEngine>, Arc<MemoryStateStore>) {
    let store = Arc::new(MemoryStateStore::new());
    let engine = Arc::new(LifecycleEngine::new(mutator, store.clone(), store.clone()));
    (engine, store)
}

#[allow(dead_code)]
pub fn mock_engine() -> (Arc<LifecycleEngine>, Arc<MemoryStateStore>) {
    engine_with(CloudMutator::new(standard_registry().unwrap()))
}

pub fn ctx() -> RequestContext {
    RequestContext::new(Credentials::new("AKIA", "secret"))
}

pub fn execution_id(records: &[ActionRecord]) -> String {
    records
        .iter()
        .find(|r| r.action == Action::HarpId)
        .expect("no harp_id record")
        .payload["harp_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub fn resume_token(records: &[ActionRecord]) -> String {
    records
        .iter()
        .find(|r| r.action == Action::Token)
        .expect("no token record")
        .payload["resume_token"]
        .as_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub fn actions(records: &[ActionRecord]) -> Vec<Action> {
    records.iter().map(|r| r.action).collect()
}

/// Names carried by records of one action kind, in log order.
#[allow(dead_code)]
pub fn names_for(records: &[ActionRecord], action: Action) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.action == action)
        .map(|r| r.payload["name"].as_str().unwrap().to_string())
        .collect()
}
