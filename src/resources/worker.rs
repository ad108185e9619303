use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{absent_if_not_found, decode, encode, patch_string, require_id, Resource};
use crate::client::{non_empty, BoundaryClient, Patch, Worker};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "boundary_worker";
const DEFAULT_SCOPE: &str = "global";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct WorkerState {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    scope_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    worker_generated_auth_token: Option<String>,
    #[serde(default)]
    controller_generated_activation_token: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    release_version: Option<String>,
    #[serde(default)]
    authorized_actions: Option<Vec<String>>,
}

impl WorkerState {
    /// Tokens are only returned on create, so later reads keep the stored ones.
    fn with_tokens_from(mut self, previous: &WorkerState) -> Self {
        if self.worker_generated_auth_token.is_none() {
            self.worker_generated_auth_token = previous.worker_generated_auth_token.clone();
        }
        if self.controller_generated_activation_token.is_none() {
            self.controller_generated_activation_token =
                previous.controller_generated_activation_token.clone();
        }
        self
    }
}

impl From<Worker> for WorkerState {
    fn from(worker: Worker) -> Self {
        Self {
            id: Some(worker.id),
            scope_id: non_empty(Some(worker.scope_id)),
            name: non_empty(worker.name),
            description: non_empty(worker.description),
            worker_generated_auth_token: None,
            controller_generated_activation_token: non_empty(
                worker.controller_generated_activation_token,
            ),
            address: non_empty(worker.address),
            release_version: non_empty(worker.release_version),
            authorized_actions: Some(worker.authorized_actions).filter(|a| !a.is_empty()),
        }
    }
}

/// `boundary_worker`: a registered worker, either worker-led or controller-led.
pub struct WorkerResource;

#[async_trait]
impl Resource for WorkerResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "A worker proxies sessions. Without a worker generated auth token the \
                 controller-led flow is used and an activation token is returned",
            )
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "scope_id",
                Attribute::optional_computed_string()
                    .with_default(Value::from(DEFAULT_SCOPE))
                    .with_force_new()
                    .with_description("The scope for the worker. Defaults to `global`"),
            )
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "worker_generated_auth_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_force_new()
                    .with_description("The token printed by a worker on first start"),
            )
            .with_attribute(
                "controller_generated_activation_token",
                Attribute::computed_string().sensitive(),
            )
            .with_attribute("address", Attribute::computed_string())
            .with_attribute("release_version", Attribute::computed_string())
            .with_attribute("authorized_actions", Attribute::computed_string_list())
    }

    async fn create(
        &self,
        client: &BoundaryClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let planned: WorkerState = decode(planned, TYPE_NAME)?;
        let created = client
            .create_worker(&Worker {
                scope_id: non_empty(planned.scope_id.clone())
                    .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
                name: non_empty(planned.name.clone()),
                description: non_empty(planned.description.clone()),
                worker_generated_auth_token: non_empty(planned.worker_generated_auth_token.clone()),
                ..Default::default()
            })
            .await?;
        info!(resource_type = TYPE_NAME, id = %created.id, "Created worker");
        encode(&WorkerState::from(created).with_tokens_from(&planned))
    }

    async fn read(
        &self,
        client: &BoundaryClient,
        current: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let current: WorkerState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        match absent_if_not_found(client.read_worker(&id).await)? {
            Some(worker) => Ok(Some(encode(
                &WorkerState::from(worker).with_tokens_from(&current),
            )?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        client: &BoundaryClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: WorkerState = decode(prior, TYPE_NAME)?;
        let mut planned: WorkerState = decode(planned, TYPE_NAME)?;
        let id = require_id(prior.id.as_deref(), TYPE_NAME)?;

        let patch = patch_string(Patch::new(), "name", &prior.name, &planned.name);
        let patch = patch_string(patch, "description", &prior.description, &planned.description);
        if patch.is_empty() {
            planned.id = Some(id);
            return encode(&planned.with_tokens_from(&prior));
        }

        let updated = client.update_worker(&id, None, patch).await?;
        info!(resource_type = TYPE_NAME, id = %id, version = updated.version, "Updated worker");
        encode(&WorkerState::from(updated).with_tokens_from(&prior))
    }

    async fn delete(&self, client: &BoundaryClient, current: Value) -> Result<(), ProviderError> {
        let current: WorkerState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        client.delete_worker(&id).await?;
        info!(resource_type = TYPE_NAME, id = %id, "Deleted worker");
        Ok(())
    }
}
