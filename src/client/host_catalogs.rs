use serde::{Deserialize, Serialize};

use super::{BoundaryClient, Patch};
use crate::error::ProviderError;

const COLLECTION: &str = "host-catalogs";

/// A host catalog as returned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostCatalog {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub scope_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing)]
    pub version: u32,
}

impl BoundaryClient {
    pub async fn create_host_catalog(
        &self,
        catalog: &HostCatalog,
    ) -> Result<HostCatalog, ProviderError> {
        let body = serde_json::to_value(catalog)?;
        self.create_item(COLLECTION, &body, "error creating host catalog")
            .await
    }

    pub async fn read_host_catalog(&self, id: &str) -> Result<HostCatalog, ProviderError> {
        self.read_item(COLLECTION, id, "error reading host catalog")
            .await
    }

    pub async fn update_host_catalog(
        &self,
        id: &str,
        version: Option<u32>,
        patch: Patch,
    ) -> Result<HostCatalog, ProviderError> {
        self.update_item(COLLECTION, id, version, patch, "error updating host catalog")
            .await
    }

    pub async fn delete_host_catalog(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_item(COLLECTION, id, "error deleting host catalog")
            .await
    }
}
