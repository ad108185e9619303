//! The subset of a Swagger 2.0 document the generator reads.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ProviderError;

const DEFINITIONS_PREFIX: &str = "#/definitions/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Swagger {
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub definitions: BTreeMap<String, SchemaObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,
    #[serde(default)]
    pub post: Option<Operation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", default)]
    pub operation_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// `query`, `path`, `body` or `header`.
    #[serde(rename = "in")]
    pub location: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseObject {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Option<SchemaObject>,
}

/// `additionalProperties` is either a flag or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaObject>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaObject {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaObject>,
    #[serde(default)]
    pub items: Option<Box<SchemaObject>>,
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
    #[serde(rename = "readOnly", default)]
    pub read_only: bool,
    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: Option<AdditionalProperties>,
}

impl Swagger {
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(json)
            .map_err(|e| ProviderError::Codegen(format!("invalid swagger document: {}", e)))
    }

    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Codegen(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Resolve `#/definitions/<name>` to the definition name and schema.
    pub fn resolve_ref<'a>(&'a self, reference: &'a str) -> Result<(&'a str, &'a SchemaObject), ProviderError> {
        let name = reference.strip_prefix(DEFINITIONS_PREFIX).ok_or_else(|| {
            ProviderError::Codegen(format!("unsupported reference {}", reference))
        })?;
        self.definitions
            .get(name)
            .map(|schema| (name, schema))
            .ok_or_else(|| ProviderError::Codegen(format!("unknown definition {}", reference)))
    }

    /// The GET operation for `path`.
    pub fn list_operation(&self, path: &str) -> Result<&Operation, ProviderError> {
        self.paths
            .get(path)
            .and_then(|item| item.get.as_ref())
            .ok_or_else(|| {
                ProviderError::Codegen(format!("no GET operation for {} in swagger document", path))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r##"{
        "paths": {
            "/v1/scopes": {
                "get": {
                    "operationId": "ScopeService_ListScopes",
                    "parameters": [
                        {"name": "recursive", "in": "query", "type": "boolean"}
                    ],
                    "responses": {
                        "200": {"schema": {"$ref": "#/definitions/ListScopesResponse"}}
                    }
                }
            }
        },
        "definitions": {
            "ListScopesResponse": {
                "type": "object",
                "properties": {
                    "items": {"type": "array", "items": {"$ref": "#/definitions/Scope"}}
                }
            },
            "Scope": {
                "type": "object",
                "properties": {
                    "id": {"type": "string", "readOnly": true},
                    "authorized_collection_actions": {
                        "type": "object",
                        "additionalProperties": {"$ref": "#/definitions/google.protobuf.ListValue"}
                    }
                }
            }
        }
    }"##;

    #[test]
    fn test_parse_and_resolve() {
        let swagger = Swagger::from_json(DOC).unwrap();
        let op = swagger.list_operation("/v1/scopes").unwrap();
        assert_eq!(op.operation_id, "ScopeService_ListScopes");
        assert_eq!(op.parameters[0].location, "query");
        assert_eq!(op.parameters[0].kind.as_deref(), Some("boolean"));

        let (name, scope) = swagger.resolve_ref("#/definitions/Scope").unwrap();
        assert_eq!(name, "Scope");
        assert!(scope.properties["id"].read_only);
        assert!(matches!(
            scope.properties["authorized_collection_actions"].additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));
    }

    #[test]
    fn test_resolve_errors() {
        let swagger = Swagger::from_json(DOC).unwrap();
        let err = swagger.resolve_ref("#/definitions/Missing").unwrap_err();
        assert_eq!(err.to_string(), "Code generation error: unknown definition #/definitions/Missing");
        assert!(swagger.resolve_ref("other.json#/Scope").is_err());
        assert!(swagger.list_operation("/v1/users").is_err());
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(Swagger::from_json("{"), Err(ProviderError::Codegen(_))));
    }
}
