use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{BoundaryClient, Patch};
use crate::error::ProviderError;

const COLLECTION: &str = "roles";

/// A role as returned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub scope_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_scope_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub principal_ids: Vec<String>,
    #[serde(default, skip_serializing)]
    pub grant_strings: Vec<String>,
    #[serde(default, skip_serializing)]
    pub version: u32,
}

impl BoundaryClient {
    pub async fn create_role(&self, role: &Role) -> Result<Role, ProviderError> {
        let body = serde_json::to_value(role)?;
        self.create_item(COLLECTION, &body, "error creating role")
            .await
    }

    pub async fn read_role(&self, id: &str) -> Result<Role, ProviderError> {
        self.read_item(COLLECTION, id, "error reading role").await
    }

    pub async fn update_role(
        &self,
        id: &str,
        version: Option<u32>,
        patch: Patch,
    ) -> Result<Role, ProviderError> {
        self.update_item(COLLECTION, id, version, patch, "error updating role")
            .await
    }

    /// Replace the users and groups the role applies to.
    pub async fn set_role_principals(
        &self,
        id: &str,
        version: Option<u32>,
        principal_ids: &[String],
    ) -> Result<Role, ProviderError> {
        self.item_action(
            COLLECTION,
            id,
            "set-principals",
            version,
            json!({ "principal_ids": principal_ids }),
            "error setting principals on role",
        )
        .await
    }

    /// Replace the grants of the role.
    pub async fn set_role_grants(
        &self,
        id: &str,
        version: Option<u32>,
        grant_strings: &[String],
    ) -> Result<Role, ProviderError> {
        self.item_action(
            COLLECTION,
            id,
            "set-grants",
            version,
            json!({ "grant_strings": grant_strings }),
            "error setting grants on role",
        )
        .await
    }

    pub async fn delete_role(&self, id: &str) -> Result<(), ProviderError> {
        self.delete_item(COLLECTION, id, "error deleting role").await
    }
}
