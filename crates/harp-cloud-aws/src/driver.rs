//! Table-driven EC2 resource driver
//!
//! One `AwsDriver` value per resource kind, configured with the provider
//! operation names, the response field carrying the assigned id, and the
//! alias table translating declaration fields into EC2 request vocabulary.

use async_trait::async_trait;
use harp_cloud::{
    to_provider_params, CloudError, Credentials, DestroyStatus, DriverOutput, ProviderApi,
    ResourceDriver, Result, HARP_NAMESPACE,
};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Driver definition for one EC2 resource kind
pub struct AwsDriver {
    pub(crate) kind: &'static str,
    pub(crate) id_prefix: &'static str,
    pub(crate) create_op: &'static str,
    pub(crate) destroy_op: &'static str,
    /// Response field carrying the provider-assigned id. `None` for
    /// resources the provider does not identify (e.g. attachments); the
    /// driver then derives a stable synthetic id from the request params.
    pub(crate) id_field: Option<&'static str>,
    /// Request field naming the resource in the destroy call.
    pub(crate) destroy_id_field: Option<&'static str>,
    /// declaration field -> provider field
    pub(crate) aliases: &'static [(&'static str, &'static str)],
    /// provider response field -> captured output name
    pub(crate) keeps: &'static [(&'static str, &'static str)],
}

impl AwsDriver {
    /// EC2 reports credential rejection as AuthFailure or
    /// UnauthorizedOperation; surface those as an authentication error
    /// rather than a generic provider failure.
    fn auth_aware(error: CloudError) -> CloudError {
        match error {
            CloudError::Provider(code)
                if code.contains("AuthFailure") || code.contains("UnauthorizedOperation") =>
            {
                CloudError::AuthenticationFailed(code)
            }
            other => other,
        }
    }

    fn synthetic_id(&self, params: &serde_json::Map<String, Value>) -> String {
        let seed = format!("{}:{}", self.kind, Value::Object(params.clone()));
        let digest = Uuid::new_v5(&HARP_NAMESPACE, seed.as_bytes())
            .simple()
            .to_string();
        format!("{}{}", self.id_prefix, &digest[..12])
    }
}

#[async_trait]
impl ResourceDriver for AwsDriver {
    fn kind(&self) -> &str {
        self.kind
    }

    fn id_prefix(&self) -> &str {
        self.id_prefix
    }

    fn alias(&self, field: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(decl, _)| *decl == field)
            .map(|(_, provider)| *provider)
    }

    async fn create(
        &self,
        api: &dyn ProviderApi,
        credentials: &Credentials,
        attributes: &HashMap<String, Value>,
    ) -> Result<DriverOutput> {
        let params = to_provider_params(self, attributes);
        let response = api
            .call(credentials, self.create_op, Value::Object(params.clone()))
            .await
            .map_err(Self::auth_aware)?;

        let id = match self.id_field {
            Some(field) => response
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    CloudError::Provider(format!(
                        "{} response missing {field}",
                        self.create_op
                    ))
                })?,
            None => self.synthetic_id(&params),
        };

        let mut outputs = HashMap::new();
        for (provider_field, output_name) in self.keeps {
            if let Some(value) = response.get(provider_field) {
                outputs.insert(output_name.to_string(), value.clone());
            }
        }

        Ok(DriverOutput { id, outputs })
    }

    async fn destroy(
        &self,
        api: &dyn ProviderApi,
        credentials: &Credentials,
        attributes: &HashMap<String, Value>,
    ) -> Result<DestroyStatus> {
        let mut recorded = attributes.clone();
        let id = recorded.remove("id");

        let mut params = to_provider_params(self, &recorded);
        if let Some(field) = self.destroy_id_field {
            let Some(id) = id else {
                tracing::warn!(kind = %self.kind, "No id recorded, nothing to delete");
                return Ok(DestroyStatus::AlreadyGone);
            };
            params.insert(field.to_string(), id);
        }

        match api
            .call(credentials, self.destroy_op, Value::Object(params))
            .await
        {
            Ok(_) => Ok(DestroyStatus::Destroyed),
            // EC2 reports missing resources with *.NotFound error codes;
            // teardown is idempotent so that is a success.
            Err(CloudError::Provider(code)) if code.contains("NotFound") => {
                Ok(DestroyStatus::AlreadyGone)
            }
            Err(e) => Err(Self::auth_aware(e)),
        }
    }
}
