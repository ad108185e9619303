use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{absent_if_not_found, decode, encode, patch_string, require_id, Resource};
use crate::client::{non_empty, BoundaryClient, HostCatalog, Patch};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "boundary_host_catalog";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HostCatalogState {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    scope_id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<HostCatalog> for HostCatalogState {
    fn from(catalog: HostCatalog) -> Self {
        Self {
            id: Some(catalog.id),
            scope_id: catalog.scope_id,
            kind: catalog.kind,
            name: non_empty(catalog.name),
            description: non_empty(catalog.description),
        }
    }
}

/// `boundary_host_catalog`: a container for hosts and host sets.
pub struct HostCatalogResource;

#[async_trait]
impl Resource for HostCatalogResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A host catalog is a collection of hosts and host sets")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "scope_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The scope ID in which the resource is created"),
            )
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The host catalog type. Only `static` is supported"),
            )
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
    }

    async fn create(
        &self,
        client: &BoundaryClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let planned: HostCatalogState = decode(planned, TYPE_NAME)?;
        let created = client
            .create_host_catalog(&HostCatalog {
                scope_id: planned.scope_id,
                kind: planned.kind,
                name: non_empty(planned.name),
                description: non_empty(planned.description),
                ..Default::default()
            })
            .await?;
        info!(resource_type = TYPE_NAME, id = %created.id, "Created host catalog");
        encode(&HostCatalogState::from(created))
    }

    async fn read(
        &self,
        client: &BoundaryClient,
        current: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let current: HostCatalogState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        match absent_if_not_found(client.read_host_catalog(&id).await)? {
            Some(catalog) => Ok(Some(encode(&HostCatalogState::from(catalog))?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        client: &BoundaryClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: HostCatalogState = decode(prior, TYPE_NAME)?;
        let mut planned: HostCatalogState = decode(planned, TYPE_NAME)?;
        let id = require_id(prior.id.as_deref(), TYPE_NAME)?;

        let patch = patch_string(Patch::new(), "name", &prior.name, &planned.name);
        let patch = patch_string(patch, "description", &prior.description, &planned.description);
        if patch.is_empty() {
            planned.id = Some(id);
            return encode(&planned);
        }

        let updated = client.update_host_catalog(&id, None, patch).await?;
        info!(resource_type = TYPE_NAME, id = %id, version = updated.version, "Updated host catalog");
        encode(&HostCatalogState::from(updated))
    }

    async fn delete(&self, client: &BoundaryClient, current: Value) -> Result<(), ProviderError> {
        let current: HostCatalogState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        client.delete_host_catalog(&id).await?;
        info!(resource_type = TYPE_NAME, id = %id, "Deleted host catalog");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_from_api_drops_empty_strings() {
        let catalog: HostCatalog = serde_json::from_value(json!({
            "id": "hcst_1234567890",
            "scope_id": "p_1234567890",
            "type": "static",
            "name": "",
            "description": "databases",
            "version": 2
        }))
        .unwrap();

        let state = encode(&HostCatalogState::from(catalog)).unwrap();
        assert_eq!(
            state,
            json!({
                "id": "hcst_1234567890",
                "scope_id": "p_1234567890",
                "type": "static",
                "name": null,
                "description": "databases"
            })
        );
    }

    #[test]
    fn test_schema_forces_new_on_scope_and_type() {
        let schema = HostCatalogResource.schema();
        assert_eq!(schema.force_new_attributes(), vec!["scope_id", "type"]);
    }
}
