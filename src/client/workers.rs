use serde::{Deserialize, Serialize};

use super::{BoundaryClient, Patch};
use crate::error::ProviderError;

const COLLECTION: &str = "workers";

/// A worker as returned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub scope_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set on create for worker-led registration; never returned by the controller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_generated_auth_token: Option<String>,
    #[serde(default, skip_serializing)]
    pub controller_generated_activation_token: Option<String>,
    #[serde(default, skip_serializing)]
    pub address: Option<String>,
    #[serde(default, skip_serializing)]
    pub release_version: Option<String>,
    #[serde(default, skip_serializing)]
    pub authorized_actions: Vec<String>,
    #[serde(default, skip_serializing)]
    pub version: u32,
}

impl BoundaryClient {
    /// Register a worker.
    ///
    /// With a worker generated auth token the worker-led flow is used; without
    /// one the controller-led flow issues an activation token.
    pub async fn create_worker(&self, worker: &Worker) -> Result<Worker, ProviderError> {
        let body = serde_json::to_value(worker)?;
        let path = if worker.worker_generated_auth_token.is_some() {
            "workers:create:worker-led"
        } else {
            "workers:create:controller-led"
        };
        self.create_item(path, &body, "error creating worker").await
    }

    pub async fn read_worker(&self, id: &str) -> Result<Worker, ProviderError> {
        self.read_item(COLLECTION, id, "error reading worker").await
    }

    pub async fn update_worker(
        &self,
        id: &str,
        version: Option<u32>,
        patch: Patch,
    ) -> Result<Worker, ProviderError> {
        self.update_item(COLLECTION, id, version, patch, "error updating worker")
            .await
    }

    pub async fn delete_worker(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_item(COLLECTION, id, "error deleting worker")
            .await
    }
}
