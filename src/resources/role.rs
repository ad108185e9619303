use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{
    absent_if_not_found, decode, encode, patch_string, require_id, same_members, set_state,
    Resource,
};
use crate::client::{non_empty, BoundaryClient, Patch, Role};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "boundary_role";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct RoleState {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    scope_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    grant_scope_id: Option<String>,
    #[serde(default)]
    principal_ids: Option<Vec<String>>,
    #[serde(default)]
    grant_strings: Option<Vec<String>>,
}

impl RoleState {
    fn principal_ids(&self) -> &[String] {
        self.principal_ids.as_deref().unwrap_or_default()
    }

    fn grant_strings(&self) -> &[String] {
        self.grant_strings.as_deref().unwrap_or_default()
    }
}

impl From<Role> for RoleState {
    fn from(role: Role) -> Self {
        Self {
            id: Some(role.id),
            scope_id: role.scope_id,
            name: non_empty(role.name),
            description: non_empty(role.description),
            grant_scope_id: non_empty(role.grant_scope_id),
            principal_ids: set_state(role.principal_ids),
            grant_strings: set_state(role.grant_strings),
        }
    }
}

/// `boundary_role`: grants permissions to users and groups within a scope.
pub struct RoleResource;

impl RoleResource {
    /// Apply principal and grant membership, chaining the version returned by
    /// each call into the next.
    async fn apply_membership(
        client: &BoundaryClient,
        id: &str,
        mut latest: Option<Role>,
        principals: Option<&[String]>,
        grants: Option<&[String]>,
    ) -> Result<Option<Role>, ProviderError> {
        if let Some(principals) = principals {
            let version = latest.as_ref().map(|role| role.version);
            let role = client.set_role_principals(id, version, principals).await?;
            debug!(resource_type = TYPE_NAME, id, principals = principals.len(), "Set role principals");
            latest = Some(role);
        }
        if let Some(grants) = grants {
            let version = latest.as_ref().map(|role| role.version);
            let role = client.set_role_grants(id, version, grants).await?;
            debug!(resource_type = TYPE_NAME, id, grants = grants.len(), "Set role grants");
            latest = Some(role);
        }
        Ok(latest)
    }
}

#[async_trait]
impl Resource for RoleResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A role grants permissions to principals within a scope")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "scope_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The scope ID in which the resource is created"),
            )
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "grant_scope_id",
                Attribute::optional_computed_string()
                    .with_description("The scope the grants apply to. Defaults to the role's scope"),
            )
            .with_attribute(
                "principal_ids",
                Attribute::optional_string_set()
                    .with_description("User and group IDs the role applies to"),
            )
            .with_attribute(
                "grant_strings",
                Attribute::optional_string_set().with_description("Grant strings for the role"),
            )
    }

    async fn create(
        &self,
        client: &BoundaryClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let planned: RoleState = decode(planned, TYPE_NAME)?;
        let created = client
            .create_role(&Role {
                scope_id: planned.scope_id.clone(),
                name: non_empty(planned.name.clone()),
                description: non_empty(planned.description.clone()),
                grant_scope_id: non_empty(planned.grant_scope_id.clone()),
                ..Default::default()
            })
            .await?;
        info!(resource_type = TYPE_NAME, id = %created.id, "Created role");

        let id = created.id.clone();
        let principals = Some(planned.principal_ids()).filter(|ids| !ids.is_empty());
        let grants = Some(planned.grant_strings()).filter(|grants| !grants.is_empty());
        let role = Self::apply_membership(client, &id, Some(created), principals, grants)
            .await?
            .unwrap_or_default();

        encode(&RoleState::from(role))
    }

    async fn read(
        &self,
        client: &BoundaryClient,
        current: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let current: RoleState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        match absent_if_not_found(client.read_role(&id).await)? {
            Some(role) => Ok(Some(encode(&RoleState::from(role))?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        client: &BoundaryClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: RoleState = decode(prior, TYPE_NAME)?;
        let mut planned: RoleState = decode(planned, TYPE_NAME)?;
        let id = require_id(prior.id.as_deref(), TYPE_NAME)?;

        let mut patch = patch_string(Patch::new(), "name", &prior.name, &planned.name);
        patch = patch_string(patch, "description", &prior.description, &planned.description);
        // An unset grant scope is server-assigned; only send explicit changes.
        if planned.grant_scope_id.is_some() {
            patch = patch_string(
                patch,
                "grant_scope_id",
                &prior.grant_scope_id,
                &planned.grant_scope_id,
            );
        }

        let principals = Some(planned.principal_ids())
            .filter(|ids| !same_members(prior.principal_ids(), ids));
        let grants = Some(planned.grant_strings())
            .filter(|grants| !same_members(prior.grant_strings(), grants));

        if patch.is_empty() && principals.is_none() && grants.is_none() {
            planned.id = Some(id);
            if planned.grant_scope_id.is_none() {
                planned.grant_scope_id = prior.grant_scope_id;
            }
            return encode(&planned);
        }

        let mut latest = None;
        if !patch.is_empty() {
            latest = Some(client.update_role(&id, None, patch).await?);
        }
        let latest = Self::apply_membership(client, &id, latest, principals, grants).await?;

        let updated = match latest {
            Some(role) => role,
            None => client.read_role(&id).await?,
        };
        info!(resource_type = TYPE_NAME, id = %id, version = updated.version, "Updated role");
        encode(&RoleState::from(updated))
    }

    async fn delete(&self, client: &BoundaryClient, current: Value) -> Result<(), ProviderError> {
        let current: RoleState = decode(current, TYPE_NAME)?;
        let id = require_id(current.id.as_deref(), TYPE_NAME)?;
        client.delete_role(&id).await?;
        info!(resource_type = TYPE_NAME, id = %id, "Deleted role");
        Ok(())
    }
}
