//! Managed Boundary resources.
//!
//! Each resource reads its JSON state into a typed struct, builds an API
//! request, calls [`BoundaryClient`] and writes the response back as state.

mod host;
mod host_catalog;
mod host_set;
mod role;
mod worker;

pub use host::HostResource;
pub use host_catalog::HostCatalogResource;
pub use host_set::HostSetResource;
pub use role::RoleResource;
pub use worker::WorkerResource;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::client::{non_empty, BoundaryClient, Patch};
use crate::error::ProviderError;
use crate::schema::Schema;

/// CRUD handlers for one resource type.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The resource type name, e.g. `boundary_host`.
    fn type_name(&self) -> &'static str;

    /// The resource schema.
    fn schema(&self) -> Schema;

    /// Create the remote object described by `planned` and return the new state.
    async fn create(&self, client: &BoundaryClient, planned: Value)
        -> Result<Value, ProviderError>;

    /// Refresh `current` from the controller.
    ///
    /// Returns `None` when the object no longer exists.
    async fn read(
        &self,
        client: &BoundaryClient,
        current: Value,
    ) -> Result<Option<Value>, ProviderError>;

    /// Apply the difference between `prior` and `planned`.
    async fn update(
        &self,
        client: &BoundaryClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object.
    async fn delete(&self, client: &BoundaryClient, current: Value) -> Result<(), ProviderError>;

    /// Load an existing object by id.
    async fn import(&self, client: &BoundaryClient, id: &str) -> Result<Value, ProviderError> {
        self.read(client, serde_json::json!({ "id": id }))
            .await?
            .ok_or_else(|| {
                ProviderError::NotFound(format!("{} {} does not exist", self.type_name(), id))
            })
    }
}

/// All resources served by the provider.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(HostCatalogResource),
        Box::new(HostResource),
        Box::new(HostSetResource),
        Box::new(RoleResource),
        Box::new(WorkerResource),
    ]
}

/// Decode JSON state into a typed state struct.
pub(crate) fn decode<T: DeserializeOwned>(value: Value, type_name: &str) -> Result<T, ProviderError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::InvalidRequest(format!("invalid {} state: {}", type_name, e)))
}

/// Encode a typed state struct as JSON state.
pub(crate) fn encode<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// The `id` recorded in state.
pub(crate) fn require_id(id: Option<&str>, type_name: &str) -> Result<String, ProviderError> {
    id.filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::InvalidRequest(format!("{} state has no id", type_name)))
}

/// Turn a not-found read into `None`, passing every other error through.
pub(crate) fn absent_if_not_found<T>(result: Result<T, ProviderError>) -> Result<Option<T>, ProviderError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Add `field` to `patch` when the planned value differs from the prior one.
///
/// Empty strings count as unset on both sides, so clearing a field sends `null`.
pub(crate) fn patch_string(
    patch: Patch,
    field: &str,
    prior: &Option<String>,
    planned: &Option<String>,
) -> Patch {
    let prior = non_empty(prior.clone());
    let planned = non_empty(planned.clone());
    if prior == planned {
        patch
    } else {
        patch.string(field, planned)
    }
}

/// Compare two string collections ignoring order and duplicates.
pub(crate) fn same_members(a: &[String], b: &[String]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

/// Normalise a string set for state: sorted, deduplicated, `None` when empty.
pub(crate) fn set_state(values: Vec<String>) -> Option<Vec<String>> {
    let set: BTreeSet<String> = values.into_iter().collect();
    if set.is_empty() {
        None
    } else {
        Some(set.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let names: BTreeSet<_> = all().iter().map(|r| r.type_name()).collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains("boundary_host_set"));
    }

    #[test]
    fn test_every_resource_has_computed_id() {
        for resource in all() {
            let schema = resource.schema();
            let id = schema.attribute("id").expect("id attribute");
            assert!(id.flags.is_computed_only(), "{}", resource.type_name());
        }
    }

    #[test]
    fn test_patch_string_only_on_change() {
        let same = patch_string(Patch::new(), "name", &Some("a".into()), &Some("a".into()));
        assert!(same.is_empty());

        let cleared = patch_string(Patch::new(), "name", &Some("a".into()), &None);
        assert_eq!(cleared.fields().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_patch_string_treats_empty_as_unset() {
        let cleared = patch_string(Patch::new(), "name", &Some("web".into()), &Some(String::new()));
        assert_eq!(cleared, Patch::new().string("name", None));

        let unchanged = patch_string(Patch::new(), "description", &None, &Some(String::new()));
        assert!(unchanged.is_empty());
    }

    #[test]
    fn test_same_members_ignores_order() {
        let a = vec!["u_1".to_string(), "u_2".to_string()];
        let b = vec!["u_2".to_string(), "u_1".to_string()];
        assert!(same_members(&a, &b));
        assert!(!same_members(&a, &b[..1]));
    }

    #[test]
    fn test_set_state() {
        assert_eq!(set_state(vec![]), None);
        assert_eq!(
            set_state(vec!["b".into(), "a".into(), "b".into()]),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_absent_if_not_found() {
        let gone: Result<(), _> = Err(ProviderError::from_api_response("read", 404, "{}"));
        assert!(absent_if_not_found(gone).unwrap().is_none());

        let denied: Result<(), _> = Err(ProviderError::from_api_response("read", 403, "{}"));
        assert!(absent_if_not_found(denied).is_err());
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some("hst_1"), "boundary_host").unwrap(), "hst_1");
        assert!(require_id(Some(""), "boundary_host").is_err());
        assert!(require_id(None, "boundary_host").is_err());
    }
}
