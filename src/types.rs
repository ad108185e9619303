//! Plan, import and metadata types shared by the provider and the gRPC layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generated;

/// The protocol version announced in the handshake line.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix printed on stdout when the server is ready.
pub const HANDSHAKE_PREFIX: &str = "BOUNDARY_PROVIDER";

/// A change to a single top-level attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub path: String,
    /// Value before the change; `None` when the attribute is being set.
    pub before: Option<Value>,
    /// Value after the change; `None` when the attribute is being removed.
    pub after: Option<Value>,
}

impl AttributeChange {
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

fn value_from_bytes(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(bytes).ok()
    }
}

fn value_to_bytes(value: Option<&Value>) -> Vec<u8> {
    value
        .and_then(|v| serde_json::to_vec(v).ok())
        .unwrap_or_default()
}

impl From<generated::AttributeChange> for AttributeChange {
    fn from(proto: generated::AttributeChange) -> Self {
        Self {
            before: value_from_bytes(&proto.before),
            after: value_from_bytes(&proto.after),
            path: proto.path,
        }
    }
}

impl From<AttributeChange> for generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            before: value_to_bytes(change.before.as_ref()),
            after: value_to_bytes(change.after.as_ref()),
            path: change.path,
        }
    }
}

/// The result of planning a resource change.
///
/// A `Null` planned state means the resource will be destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub planned_state: Value,
    pub changes: Vec<AttributeChange>,
    pub requires_replace: bool,
}

impl PlanResult {
    /// Nothing to do; the state stays as it is.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Whether the plan changes anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Whether the plan destroys the resource.
    pub fn is_delete(&self) -> bool {
        self.planned_state.is_null()
    }

    /// Names of the attributes this plan touches.
    pub fn changed_paths(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.path.as_str()).collect()
    }
}

/// A resource loaded by `import`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    pub resource_type: String,
    pub state: Value,
}

impl ImportedResource {
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

impl From<ImportedResource> for generated::ImportedResource {
    fn from(imported: ImportedResource) -> Self {
        Self {
            resource_type: imported.resource_type,
            state: value_to_bytes(Some(&imported.state)),
        }
    }
}

/// Resource and data source names advertised by `GetMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    pub resources: Vec<String>,
    pub data_sources: Vec<String>,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// The provider plans deletes itself (null proposed state).
    pub plan_destroy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("web"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("web")));

        let removed = AttributeChange::removed("address", json!("10.0.0.1"));
        assert_eq!(removed.before, Some(json!("10.0.0.1")));
        assert!(removed.after.is_none());
    }

    #[test]
    fn test_attribute_change_proto_conversion() {
        let change = AttributeChange::modified("host_ids", json!(["hst_1"]), json!(["hst_2"]));
        let proto: generated::AttributeChange = change.clone().into();
        assert_eq!(proto.path, "host_ids");
        assert_eq!(AttributeChange::from(proto), change);

        let added: generated::AttributeChange = AttributeChange::added("name", json!("a")).into();
        assert!(added.before.is_empty());
        assert!(AttributeChange::from(added).before.is_none());
    }

    #[test]
    fn test_plan_result() {
        let unchanged = PlanResult::no_change(json!({"id": "hst_1"}));
        assert!(!unchanged.has_changes());
        assert!(!unchanged.is_delete());

        let delete = PlanResult::with_changes(
            Value::Null,
            vec![AttributeChange::removed("id", json!("hst_1"))],
            false,
        );
        assert!(delete.is_delete());
        assert_eq!(delete.changed_paths(), vec!["id"]);
    }

    #[test]
    fn test_imported_resource_to_proto() {
        let imported = ImportedResource::new("boundary_host", json!({"id": "hst_1"}));
        let proto: generated::ImportedResource = imported.into();
        assert_eq!(proto.resource_type, "boundary_host");
        assert_eq!(proto.state, br#"{"id":"hst_1"}"#.to_vec());
    }
}
