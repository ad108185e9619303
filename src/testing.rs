//! Drive a [`ProviderService`] in tests without the gRPC layer.
//!
//! ```ignore
//! use boundary_provider::testing::ProviderTester;
//! use boundary_provider::BoundaryProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn creates_host_catalog() {
//!     let tester = ProviderTester::new(BoundaryProvider::new());
//!     tester
//!         .configure(json!({"addr": server.uri(), "token": "at_1234567890"}))
//!         .await
//!         .unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("boundary_host_catalog", json!({"scope_id": "p_1234567890", "type": "static"}))
//!         .await
//!         .unwrap();
//!     assert_eq!(state["type"], "static");
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Wraps a provider and exposes each operation as a plain async call.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider
    // =========================================================================

    /// Validate the provider block. Error diagnostics become `Err`.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.validate_provider_config(config).await?)
    }

    /// Configure the provider. Error diagnostics become `Err`.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.configure(config).await?)
    }

    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resources
    // =========================================================================

    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    /// Plan a create, using `config` as both proposed state and config.
    pub async fn plan_create(&self, resource_type: &str, config: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    pub async fn plan_delete(&self, resource_type: &str, prior_state: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource. `Value::Null` means it is gone.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data sources
    // =========================================================================

    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_data_source_config(data_source_type, config)
                .await?,
        )
    }

    pub async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycles
    // =========================================================================

    /// Plan, create, then read back the new resource.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan, update, then read back. A plan without changes skips the update.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        let updated = if plan.has_changes() {
            self.update(resource_type, prior_state, plan.planned_state)
                .await?
        } else {
            prior_state
        };
        self.read(resource_type, updated).await
    }

    pub async fn lifecycle_delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Create, update and delete one resource. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }
}

/// A tester call that failed with error diagnostics or a provider error.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diagnostics.len());
    for diag in diagnostics {
        out.push_str(&format!("\n  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {}", detail));
        }
        if let Some(attribute) = &diag.attribute {
            out.push_str(&format!(" (at {})", attribute));
        }
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertions
// =========================================================================

pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(plan.has_changes(), "Expected plan to have changes for create, but got no changes");
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        !plan.has_changes(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changed_paths()
    );
}

pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "Expected plan to require replacement, but it does not");
}

pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(plan.has_changes(), "Expected plan to have changes, but got no changes");
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

pub fn assert_plan_deletes(plan: &PlanResult) {
    assert!(
        plan.is_delete(),
        "Expected plan to delete, but planned state is {}",
        plan.planned_state
    );
}

pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changed_paths().contains(&path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changed_paths()
    );
}

pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        !plan.changed_paths().contains(&path),
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).map(|d| &d.summary).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors
    );
}

/// Assert that some error diagnostic's summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).map(|d| &d.summary).collect();
    assert!(
        errors.iter().any(|summary| summary.contains(substring)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        errors
    );
}

/// Assert that some error diagnostic points at `attribute`.
pub fn assert_error_at(diagnostics: &[Diagnostic], attribute: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.attribute.as_deref() == Some(attribute)),
        "Expected an error at '{}'. Diagnostics: {:?}",
        attribute,
        diagnostics
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::plan_change;
    use crate::schema::{Attribute, Schema};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Keeps hosts in memory, numbering ids from 1.
    #[derive(Default)]
    struct MemoryProvider {
        hosts: Mutex<BTreeMap<String, Value>>,
    }

    fn host_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("host_catalog_id", Attribute::required_string().with_force_new())
            .with_attribute("address", Attribute::optional_string())
    }

    #[async_trait::async_trait]
    impl ProviderService for MemoryProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new().with_resource("boundary_host", host_schema())
        }

        async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            if config["addr"].is_string() {
                Ok(vec![])
            } else {
                Ok(vec![Diagnostic::error("Missing Boundary address").with_attribute("addr")])
            }
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            plan_change(&host_schema(), prior_state.as_ref(), &proposed_state)
        }

        async fn create(&self, _resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
            let mut hosts = self.hosts.lock().unwrap();
            let mut state = planned_state;
            let id = format!("hst_{}", hosts.len() + 1);
            state["id"] = json!(id);
            hosts.insert(id, state.clone());
            Ok(state)
        }

        async fn read(&self, _resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
            let hosts = self.hosts.lock().unwrap();
            let id = current_state["id"].as_str().unwrap_or_default();
            Ok(hosts.get(id).cloned().unwrap_or(Value::Null))
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            let id = planned_state["id"].as_str().unwrap_or_default().to_string();
            self.hosts.lock().unwrap().insert(id, planned_state.clone());
            Ok(planned_state)
        }

        async fn delete(&self, _resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
            let id = current_state["id"].as_str().unwrap_or_default();
            self.hosts
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| ProviderError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn test_configure_reports_diagnostics() {
        let tester = ProviderTester::new(MemoryProvider::default());
        assert!(tester.configure(json!({"addr": "http://127.0.0.1:9200"})).await.is_ok());

        match tester.configure(json!({})).await {
            Err(TestError::Diagnostics(diagnostics)) => assert_error_at(&diagnostics, "addr"),
            other => panic!("expected diagnostics, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_metadata_from_schema() {
        let tester = ProviderTester::new(MemoryProvider::default());
        assert_eq!(tester.resource_types(), vec!["boundary_host".to_string()]);
        assert!(tester.data_source_types().is_empty());
    }

    #[tokio::test]
    async fn test_plans() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let plan = tester
            .plan_create("boundary_host", json!({"host_catalog_id": "hcst_1"}))
            .await
            .unwrap();
        assert_plan_creates(&plan);

        let prior = json!({"id": "hst_1", "host_catalog_id": "hcst_1", "address": "10.0.0.1"});
        let plan = tester
            .plan_update("boundary_host", prior.clone(), json!({"host_catalog_id": "hcst_1", "address": "10.0.0.2"}))
            .await
            .unwrap();
        assert_plan_updates_in_place(&plan);
        assert_plan_changes_attribute(&plan, "address");
        assert_plan_does_not_change_attribute(&plan, "host_catalog_id");

        let plan = tester
            .plan_update("boundary_host", prior.clone(), json!({"host_catalog_id": "hcst_2", "address": "10.0.0.1"}))
            .await
            .unwrap();
        assert_plan_replaces(&plan);

        let plan = tester.plan_delete("boundary_host", prior).await.unwrap();
        assert_plan_deletes(&plan);
    }

    #[tokio::test]
    async fn test_lifecycle_crud() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let updated = tester
            .lifecycle_crud(
                "boundary_host",
                json!({"host_catalog_id": "hcst_1", "address": "10.0.0.1"}),
                json!({"host_catalog_id": "hcst_1", "address": "10.0.0.2"}),
            )
            .await
            .unwrap();

        assert_eq!(updated["id"], "hst_1");
        assert_eq!(updated["address"], "10.0.0.2");
        assert_eq!(tester.read("boundary_host", updated).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_lifecycle_update_without_changes() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let created = tester
            .lifecycle_create("boundary_host", json!({"host_catalog_id": "hcst_1"}))
            .await
            .unwrap();
        let same = tester
            .lifecycle_update("boundary_host", created.clone(), json!({"host_catalog_id": "hcst_1"}))
            .await
            .unwrap();
        assert_eq!(same, created);
    }

    #[tokio::test]
    async fn test_import_unsupported_by_default() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let err = tester.import_resource("boundary_host", "hst_1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
    }

    #[test]
    fn test_assertions() {
        assert_no_errors(&[Diagnostic::warning("Deprecated attribute")]);
        assert_error_contains(&[Diagnostic::error("Invalid address value")], "address");
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Missing required attribute 'scope_id'").with_attribute("scope_id"),
            Diagnostic::error("Missing Boundary credentials").with_detail("Set `token`"),
        ]);

        let display = err.to_string();
        assert!(display.starts_with("Operation failed with 2 diagnostic(s):"));
        assert!(display.contains("(at scope_id)"));
        assert!(display.contains("Missing Boundary credentials: Set `token`"));
    }
}
