use serde::{Deserialize, Serialize};

use super::{BoundaryClient, Patch};
use crate::error::ProviderError;

const COLLECTION: &str = "hosts";

/// Type-specific attributes of a static host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A host as returned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<HostAttributes>,
    #[serde(default, skip_serializing)]
    pub version: u32,
}

impl Host {
    /// The static host address, if any.
    pub fn address(&self) -> Option<String> {
        self.attributes.as_ref().and_then(|a| a.address.clone())
    }
}

impl BoundaryClient {
    pub async fn create_host(&self, host: &Host) -> Result<Host, ProviderError> {
        let body = serde_json::to_value(host)?;
        self.create_item(COLLECTION, &body, "error creating host")
            .await
    }

    pub async fn read_host(&self, id: &str) -> Result<Host, ProviderError> {
        self.read_item(COLLECTION, id, "error reading host").await
    }

    pub async fn update_host(
        &self,
        id: &str,
        version: Option<u32>,
        patch: Patch,
    ) -> Result<Host, ProviderError> {
        self.update_item(COLLECTION, id, version, patch, "error updating host")
            .await
    }

    pub async fn delete_host(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_item(COLLECTION, id, "error deleting host").await
    }
}
