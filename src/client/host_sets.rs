use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{BoundaryClient, Patch};
use crate::error::ProviderError;

const COLLECTION: &str = "host-sets";

/// A host set as returned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSet {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub host_catalog_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing)]
    pub host_ids: Vec<String>,
    #[serde(default, skip_serializing)]
    pub version: u32,
}

impl BoundaryClient {
    pub async fn create_host_set(&self, set: &HostSet) -> Result<HostSet, ProviderError> {
        let body = serde_json::to_value(set)?;
        self.create_item(COLLECTION, &body, "error creating host set")
            .await
    }

    pub async fn read_host_set(&self, id: &str) -> Result<HostSet, ProviderError> {
        self.read_item(COLLECTION, id, "error reading host set")
            .await
    }

    pub async fn update_host_set(
        &self,
        id: &str,
        version: Option<u32>,
        patch: Patch,
    ) -> Result<HostSet, ProviderError> {
        self.update_item(COLLECTION, id, version, patch, "error updating host set")
            .await
    }

    /// Replace the host membership of a set.
    pub async fn set_host_set_hosts(
        &self,
        id: &str,
        version: Option<u32>,
        host_ids: &[String],
    ) -> Result<HostSet, ProviderError> {
        self.item_action(
            COLLECTION,
            id,
            "set-hosts",
            version,
            json!({ "host_ids": host_ids }),
            "error setting hosts on host set",
        )
        .await
    }

    pub async fn delete_host_set(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_item(COLLECTION, id, "error deleting host set")
            .await
    }
}
