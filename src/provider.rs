//! The Boundary provider: configuration, planning and dispatch to resources
//! and data sources.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::BoundaryClient;
use crate::config::ProviderConfig;
use crate::datasources;
use crate::error::ProviderError;
use crate::resources::{self, Resource};
use crate::schema::{has_errors, AttributeType, Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::types::{AttributeChange, ImportedResource, PlanResult};
use crate::validation;

/// Serves the Boundary resources and data sources.
///
/// The HTTP client is built by `configure`; every CRUD or data source call
/// made before that fails with a configuration error.
pub struct BoundaryProvider {
    client: RwLock<Option<Arc<BoundaryClient>>>,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
}

impl BoundaryProvider {
    pub fn new() -> Self {
        Self {
            client: RwLock::new(None),
            resources: resources::all()
                .into_iter()
                .map(|resource| (resource.type_name(), resource))
                .collect(),
        }
    }

    /// Whether `configure` has succeeded.
    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|resource| resource.as_ref())
            .ok_or_else(|| {
                ProviderError::UnknownResource(format!("unknown resource type: {}", resource_type))
            })
    }

    fn data_source(
        &self,
        data_source_type: &str,
    ) -> Result<&'static datasources::ListDataSource, ProviderError> {
        datasources::find(data_source_type).ok_or_else(|| {
            ProviderError::UnknownResource(format!("unknown data source type: {}", data_source_type))
        })
    }

    async fn client(&self) -> Result<Arc<BoundaryClient>, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Configuration("provider not configured".to_string()))
    }
}

impl Default for BoundaryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for BoundaryProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = self.resources.values().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, resource| schema.with_resource(resource.type_name(), resource.schema()),
        );
        datasources::all().iter().fold(schema, |schema, data_source| {
            schema.with_data_source(data_source.name, (data_source.schema)())
        })
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }
        match ProviderConfig::from_value(config) {
            Ok(parsed) => diagnostics.extend(parsed.diagnostics()),
            Err(e) => diagnostics.push(Diagnostic::error(e.to_string())),
        }
        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = ProviderConfig::from_value(config)?;
        let diagnostics = config.diagnostics();
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }

        let client = BoundaryClient::connect(&config).await?;
        info!(addr = %client.addr(), "Configured Boundary client");
        *self.client.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        debug!("Dropped Boundary client");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(validation::validate(&resource.schema(), &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        plan_change(&resource.schema(), prior_state.as_ref(), &proposed_state)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = resource.create(&client, planned_state).await?;
        info!(resource_type, id = %state["id"], "Created resource");
        Ok(state)
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        match resource.read(&client, current_state).await? {
            Some(state) => Ok(state),
            None => {
                info!(resource_type, "Resource no longer exists");
                Ok(Value::Null)
            },
        }
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.update(&client, prior_state, planned_state).await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let id = current_state["id"].clone();
        resource.delete(&client, current_state).await?;
        info!(resource_type, id = %id, "Deleted resource");
        Ok(())
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = resource.import(&client, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        Ok(validation::validate(&(data_source.schema)(), &config))
    }

    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client().await?;
        data_source.read(&client, config).await
    }
}

/// Diff `proposed` against `prior` over the top-level attributes of `schema`.
///
/// A missing `prior` plans a create and a null `proposed` plans a delete.
pub fn plan_change(
    schema: &Schema,
    prior: Option<&Value>,
    proposed: &Value,
) -> Result<PlanResult, ProviderError> {
    let prior_map = match prior {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => return Err(ProviderError::InvalidRequest("prior state is not an object".to_string())),
    };

    let proposed_map = match proposed {
        Value::Null => {
            let changes = prior_map
                .into_iter()
                .flatten()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| AttributeChange::removed(name.clone(), value.clone()))
                .collect();
            return Ok(PlanResult::with_changes(Value::Null, changes, false));
        },
        Value::Object(map) => map,
        _ => return Err(ProviderError::InvalidRequest("proposed state is not an object".to_string())),
    };

    let mut planned = proposed_map.clone();
    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.block.attributes {
        let mut value = proposed_map.get(name).cloned().unwrap_or(Value::Null);
        let before = prior_map.and_then(|map| map.get(name)).cloned().unwrap_or(Value::Null);

        if value.is_null() {
            if attr.flags.computed && prior_map.is_some() {
                value = before.clone();
            } else if let Some(default) = &attr.default {
                value = default.clone();
            }
        }
        if prior_map.is_none() && attr.flags.is_computed_only() {
            value = Value::Null;
        }

        if !attr.flags.is_computed_only() && !equivalent(&attr.attr_type, &before, &value) {
            changes.push(AttributeChange::new(
                name.clone(),
                Some(before).filter(|v| !v.is_null()),
                Some(value.clone()).filter(|v| !v.is_null()),
            ));
            if attr.force_new && prior_map.is_some() {
                requires_replace = true;
            }
        }
        planned.insert(name.clone(), value);
    }

    if requires_replace {
        clear_computed(schema, &mut planned);
    }

    let planned = Value::Object(planned);
    if changes.is_empty() {
        Ok(PlanResult::no_change(planned))
    } else {
        Ok(PlanResult::with_changes(planned, changes, requires_replace))
    }
}

/// A replaced resource gets fresh computed values.
fn clear_computed(schema: &Schema, planned: &mut Map<String, Value>) {
    for name in schema.computed_attributes() {
        let computed_only = schema
            .attribute(name)
            .map_or(false, |attr| attr.flags.is_computed_only());
        if computed_only {
            planned.insert(name.to_string(), Value::Null);
        }
    }
}

/// Compare two attribute values. Sets ignore order and duplicates, and an
/// empty collection equals null.
fn equivalent(attr_type: &AttributeType, a: &Value, b: &Value) -> bool {
    normalize(attr_type, a) == normalize(attr_type, b)
}

fn normalize(attr_type: &AttributeType, value: &Value) -> Value {
    match (attr_type, value) {
        (AttributeType::List(_) | AttributeType::Set(_), Value::Null) => Value::Array(vec![]),
        (AttributeType::Map(_), Value::Null) => Value::Object(Map::new()),
        (AttributeType::Set(_), Value::Array(items)) => {
            let mut items = items.clone();
            items.sort_by_key(|item| item.to_string());
            items.dedup();
            Value::Array(items)
        },
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    fn host_set_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("host_catalog_id", Attribute::required_string().with_force_new())
            .with_attribute("name", Attribute::optional_string())
            .with_attribute("host_ids", Attribute::optional_string_set())
    }

    #[test]
    fn test_plan_create_adds_configured_attributes() {
        let plan = plan_change(
            &host_set_schema(),
            None,
            &json!({"host_catalog_id": "hcst_1", "name": "web", "id": "ignored"}),
        )
        .unwrap();

        assert!(!plan.requires_replace);
        assert_eq!(plan.changed_paths(), vec!["host_catalog_id", "name"]);
        assert_eq!(plan.planned_state["id"], Value::Null);
        assert_eq!(plan.planned_state["host_ids"], Value::Null);
    }

    #[test]
    fn test_plan_update_carries_computed_and_ignores_set_order() {
        let prior = json!({
            "id": "hsst_1",
            "host_catalog_id": "hcst_1",
            "name": "web",
            "host_ids": ["hst_1", "hst_2"]
        });
        let proposed = json!({
            "host_catalog_id": "hcst_1",
            "name": "web",
            "host_ids": ["hst_2", "hst_1"]
        });

        let plan = plan_change(&host_set_schema(), Some(&prior), &proposed).unwrap();
        assert!(!plan.has_changes());
        assert_eq!(plan.planned_state["id"], "hsst_1");
    }

    #[test]
    fn test_plan_update_in_place() {
        let prior = json!({"id": "hsst_1", "host_catalog_id": "hcst_1", "name": "web"});
        let proposed = json!({"host_catalog_id": "hcst_1", "name": null, "host_ids": []});

        let plan = plan_change(&host_set_schema(), Some(&prior), &proposed).unwrap();
        assert_eq!(plan.changed_paths(), vec!["name"]);
        assert_eq!(plan.changes[0].after, None);
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["id"], "hsst_1");
    }

    #[test]
    fn test_plan_force_new_replaces() {
        let prior = json!({"id": "hsst_1", "host_catalog_id": "hcst_1"});
        let proposed = json!({"host_catalog_id": "hcst_2"});

        let plan = plan_change(&host_set_schema(), Some(&prior), &proposed).unwrap();
        assert!(plan.requires_replace);
        assert_eq!(plan.planned_state["id"], Value::Null);
    }

    #[test]
    fn test_plan_delete() {
        let prior = json!({"id": "hsst_1", "host_catalog_id": "hcst_1", "name": null});
        let plan = plan_change(&host_set_schema(), Some(&prior), &Value::Null).unwrap();

        assert!(plan.is_delete());
        let mut paths = plan.changed_paths();
        paths.sort();
        assert_eq!(paths, vec!["host_catalog_id", "id"]);
    }

    #[test]
    fn test_plan_applies_defaults() {
        let schema = Schema::v0().with_attribute(
            "scope_id",
            Attribute::optional_computed_string().with_default(json!("global")),
        );
        let plan = plan_change(&schema, None, &json!({})).unwrap();
        assert_eq!(plan.planned_state["scope_id"], "global");
        assert_eq!(plan.changed_paths(), vec!["scope_id"]);
    }

    #[test]
    fn test_plan_rejects_non_object() {
        assert!(plan_change(&host_set_schema(), None, &json!("host")).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_calls_fail() {
        let provider = BoundaryProvider::new();
        assert!(!provider.is_configured().await);

        let err = provider
            .read("boundary_host", json!({"id": "hst_1"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: provider not configured");
    }

    #[tokio::test]
    async fn test_unknown_types() {
        let provider = BoundaryProvider::new();
        let err = provider
            .validate_resource_config("boundary_target", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider
            .read_data_source("boundary_targets", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[test]
    fn test_schema_covers_everything() {
        let schema = BoundaryProvider::new().schema();
        assert_eq!(schema.resources.len(), 5);
        assert_eq!(schema.data_sources.len(), 4);
        assert!(schema.provider.attribute("addr").is_some());
    }
}
