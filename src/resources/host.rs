use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{absent_if_not_found, decode, encode, patch_string, require_id, Resource};
use crate::client::{non_empty, BoundaryClient, Host, HostAttributes, Patch};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "boundary_host";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HostState {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    host_catalog_id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

impl From<Host> for HostState {
    fn from(host: Host) -> Self {
        Self {
            address: non_empty(host.address()),
            id: Some(host.id),
            host_catalog_id: host.host_catalog_id,
            kind: host.kind,
            name: non_empty(host.name),
            description: non_empty(host.description),
        }
    }
}

/// `boundary_host`: a static host inside a host catalog.
pub struct HostResource;

#[async_trait]
impl Resource for HostResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A host is a network address reachable through a target")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "host_catalog_id",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The host type. Only `static` is supported"),
            )
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "address",
                Attribute::optional_string()
                    .with_description("The static address of the host (IP or DNS name)"),
            )
    }

    async fn create(
        &self,
        client: &BoundaryClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let planned: HostState = decode(planned, TYPE_NAME)?;
        let address = non_empty(planned.address);
        let created = client
            .create_host(&Host {
                host_catalog_id: planned.host_catalog_id,
                kind: planned.kind,
                name: non_empty(planned.name),
                description: non_empty(planned.description),
                attributes: address.map(|address| HostAttributes {
                    address: Some(address),
                }),
                ..Default::default()
            })
            .await?;
        info!(resource_type = TYPE_NAME, id = %created.id, "Created host");
        encode(&HostState::from(created))
    }

    async fn read(
        &self,
        client: &BoundaryClient,
        current: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let current: HostState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        match absent_if_not_found(client.read_host(&id).await)? {
            Some(host) => Ok(Some(encode(&HostState::from(host))?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        client: &BoundaryClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: HostState = decode(prior, TYPE_NAME)?;
        let mut planned: HostState = decode(planned, TYPE_NAME)?;
        let id = require_id(prior.id.as_deref(), TYPE_NAME)?;

        let mut patch = patch_string(Patch::new(), "name", &prior.name, &planned.name);
        patch = patch_string(patch, "description", &prior.description, &planned.description);
        let address = non_empty(planned.address.clone());
        if non_empty(prior.address.clone()) != address {
            patch = patch.value("attributes", json!({ "address": address }));
        }
        if patch.is_empty() {
            planned.id = Some(id);
            return encode(&planned);
        }

        let updated = client.update_host(&id, None, patch).await?;
        info!(resource_type = TYPE_NAME, id = %id, version = updated.version, "Updated host");
        encode(&HostState::from(updated))
    }

    async fn delete(&self, client: &BoundaryClient, current: Value) -> Result<(), ProviderError> {
        let current: HostState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        client.delete_host(&id).await?;
        info!(resource_type = TYPE_NAME, id = %id, "Deleted host");
        Ok(())
    }
}
