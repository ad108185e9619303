use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{
    absent_if_not_found, decode, encode, patch_string, require_id, same_members, set_state,
    Resource,
};
use crate::client::{non_empty, BoundaryClient, HostSet, Patch};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "boundary_host_set";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HostSetState {
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
    host_ids: Option<Vec<String>>,
}

impl HostSetState {
    fn host_ids(&self) -> &[String] {
        self.host_ids.as_deref().unwrap_or_default()
    }
}

impl From<HostSet> for HostSetState {
    fn from(set: HostSet) -> Self {
        Self {
            id: Some(set.id),
            host_catalog_id: set.host_catalog_id,
            kind: set.kind,
            name: non_empty(set.name),
            description: non_empty(set.description),
            host_ids: set_state(set.host_ids),
        }
    }
}

/// `boundary_host_set`: a named group of hosts from one catalog.
pub struct HostSetResource;

#[async_trait]
impl Resource for HostSetResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A host set groups hosts from a single host catalog")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "host_catalog_id",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute("type", Attribute::required_string().with_force_new())
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "host_ids",
                Attribute::optional_string_set()
                    .with_description("The hosts that are members of this set"),
            )
    }

    async fn create(
        &self,
        client: &BoundaryClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let planned: HostSetState = decode(planned, TYPE_NAME)?;
        let mut created = client
            .create_host_set(&HostSet {
                host_catalog_id: planned.host_catalog_id.clone(),
                kind: planned.kind.clone(),
                name: non_empty(planned.name.clone()),
                description: non_empty(planned.description.clone()),
                ..Default::default()
            })
            .await?;
        info!(resource_type = TYPE_NAME, id = %created.id, "Created host set");

        if !planned.host_ids().is_empty() {
            created = client
                .set_host_set_hosts(&created.id, Some(created.version), planned.host_ids())
                .await?;
            debug!(resource_type = TYPE_NAME, id = %created.id, hosts = planned.host_ids().len(), "Set host set members");
        }

        encode(&HostSetState::from(created))
    }

    async fn read(
        &self,
        client: &BoundaryClient,
        current: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let current: HostSetState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        match absent_if_not_found(client.read_host_set(&id).await)? {
            Some(set) => Ok(Some(encode(&HostSetState::from(set))?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        client: &BoundaryClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: HostSetState = decode(prior, TYPE_NAME)?;
        let mut planned: HostSetState = decode(planned, TYPE_NAME)?;
        let id = require_id(prior.id.as_deref(), TYPE_NAME)?;

        let patch = patch_string(Patch::new(), "name", &prior.name, &planned.name);
        let patch = patch_string(patch, "description", &prior.description, &planned.description);
        let members_changed = !same_members(prior.host_ids(), planned.host_ids());

        if patch.is_empty() && !members_changed {
            planned.id = Some(id);
            return encode(&planned);
        }

        let mut latest = None;
        if !patch.is_empty() {
            latest = Some(client.update_host_set(&id, None, patch).await?);
        }
        if members_changed {
            let version = latest.as_ref().map(|set: &HostSet| set.version);
            latest = Some(
                client
                    .set_host_set_hosts(&id, version, planned.host_ids())
                    .await?,
            );
        }

        let updated = match latest {
            Some(set) => set,
            None => client.read_host_set(&id).await?,
        };
        info!(resource_type = TYPE_NAME, id = %id, version = updated.version, "Updated host set");
        encode(&HostSetState::from(updated))
    }

    async fn delete(&self, client: &BoundaryClient, current: Value) -> Result<(), ProviderError> {
        let current: HostSetState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        client.delete_host_set(&id).await?;
        info!(resource_type = TYPE_NAME, id = %id, "Deleted host set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_sorts_host_ids() {
        let set: HostSet = serde_json::from_value(json!({
            "id": "hsst_1234567890",
            "host_catalog_id": "hcst_1234567890",
            "type": "static",
            "host_ids": ["hst_b", "hst_a"],
            "version": 3
        }))
        .unwrap();

        let state = HostSetState::from(set);
        assert_eq!(
            state.host_ids,
            Some(vec!["hst_a".to_string(), "hst_b".to_string()])
        );
    }

    #[test]
    fn test_missing_host_ids_are_empty() {
        let state: HostSetState = decode(
            json!({"host_catalog_id": "hcst_1", "type": "static", "host_ids": null}),
            TYPE_NAME,
        )
        .unwrap();
        assert!(state.host_ids().is_empty());
    }
}
