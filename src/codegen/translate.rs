//! Swagger schemas to provider schema types.
//!
//! | Swagger                                      | Result                          |
//! |----------------------------------------------|---------------------------------|
//! | `string` / `integer` / `number` / `boolean`  | String / Int64 / Float64 / Bool |
//! | array of scalars                             | `List(scalar)`                  |
//! | array of objects                             | nested list block               |
//! | object with properties                       | nested list block, max 1 item   |
//! | object with `additionalProperties`           | `Map(element)`                  |
//! | anything else, and protobuf well-known types | `Dynamic`                       |
//!
//! A reference already on the walk path becomes `Dynamic`, which cuts cycles.

use serde::Serialize;

use super::swagger::{AdditionalProperties, Operation, Swagger, SchemaObject};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock};

/// Definitions that carry arbitrary JSON.
const DYNAMIC_DEFINITIONS: &[&str] = &[
    "google.protobuf.Struct",
    "google.protobuf.Value",
    "google.protobuf.ListValue",
    "google.protobuf.Any",
];

/// One translated property.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Attribute(AttributeType),
    Block(NestedBlock),
}

/// A list data source to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceTarget {
    /// Data source type name, e.g. `boundary_scopes`.
    pub name: String,
    /// List path in the Swagger document, e.g. `/v1/scopes`.
    pub path: String,
}

impl std::str::FromStr for DataSourceTarget {
    type Err = ProviderError;

    /// Parse `name=path`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, path)) if !name.is_empty() && path.starts_with('/') => Ok(Self {
                name: name.to_string(),
                path: path.to_string(),
            }),
            _ => Err(ProviderError::Codegen(format!(
                "invalid data source target {:?}, expected name=/v1/path",
                s
            ))),
        }
    }
}

/// The data sources generated when no targets are given.
pub fn default_targets() -> Vec<DataSourceTarget> {
    [
        ("boundary_auth_methods", "/v1/auth-methods"),
        ("boundary_groups", "/v1/groups"),
        ("boundary_scopes", "/v1/scopes"),
        ("boundary_users", "/v1/users"),
    ]
    .into_iter()
    .map(|(name, path)| DataSourceTarget {
        name: name.to_string(),
        path: path.to_string(),
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryParamKind {
    String,
    Bool,
    Int,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParamSpec {
    pub name: String,
    pub kind: QueryParamKind,
    pub description: Option<String>,
}

/// Everything needed to render one data source.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceSpec {
    pub name: String,
    /// Module name for the generated file.
    pub module: String,
    pub path: String,
    /// Collection path below `/v1/`.
    pub collection: String,
    pub operation_id: String,
    pub description: String,
    /// Query parameters sorted by name.
    pub query: Vec<QueryParamSpec>,
    /// Name of the item definition.
    pub item_definition: String,
    /// One list element, every field computed.
    pub item_block: Block,
}

impl DataSourceSpec {
    pub fn from_swagger(swagger: &Swagger, target: &DataSourceTarget) -> Result<Self, ProviderError> {
        let operation = swagger.list_operation(&target.path)?;
        let (item_definition, item_schema) = list_item_definition(swagger, operation, &target.path)?;
        let item_block = translate_object(swagger, item_schema, &mut vec![item_definition.to_string()])?;

        let mut query: Vec<QueryParamSpec> = operation
            .parameters
            .iter()
            .filter(|p| p.location == "query")
            .map(|p| QueryParamSpec {
                name: p.name.clone(),
                kind: match p.kind.as_deref() {
                    Some("boolean") => QueryParamKind::Bool,
                    Some("integer") => QueryParamKind::Int,
                    _ => QueryParamKind::String,
                },
                description: p.description.clone(),
            })
            .collect();
        query.sort_by(|a, b| a.name.cmp(&b.name));

        let collection = target
            .path
            .strip_prefix("/v1/")
            .unwrap_or(target.path.trim_start_matches('/'))
            .to_string();

        Ok(Self {
            module: target
                .name
                .strip_prefix("boundary_")
                .unwrap_or(&target.name)
                .replace('-', "_"),
            name: target.name.clone(),
            path: target.path.clone(),
            description: operation
                .summary
                .clone()
                .unwrap_or_else(|| format!("Lists {}.", collection)),
            collection,
            operation_id: operation.operation_id.clone(),
            query,
            item_definition: item_definition.to_string(),
            item_block,
        })
    }
}

/// Follow the 200 response to the definition of one `items` element.
fn list_item_definition<'a>(
    swagger: &'a Swagger,
    operation: &'a Operation,
    path: &str,
) -> Result<(&'a str, &'a SchemaObject), ProviderError> {
    let missing = |what: &str| ProviderError::Codegen(format!("{} for {}: {}", operation.operation_id, path, what));

    let response = operation
        .responses
        .get("200")
        .and_then(|r| r.schema.as_ref())
        .ok_or_else(|| missing("no 200 response schema"))?;
    let response = match &response.reference {
        Some(reference) => swagger.resolve_ref(reference)?.1,
        None => response,
    };
    let item_ref = response
        .properties
        .get("items")
        .and_then(|items| items.items.as_ref())
        .and_then(|item| item.reference.as_deref())
        .ok_or_else(|| missing("response has no items array of a definition"))?;
    swagger.resolve_ref(item_ref)
}

/// Translate an object schema into a block of computed attributes.
pub fn translate_object(
    swagger: &Swagger,
    schema: &SchemaObject,
    visited: &mut Vec<String>,
) -> Result<Block, ProviderError> {
    let mut block = Block::new();
    for (name, property) in &schema.properties {
        match translate_schema(swagger, property, visited)? {
            Field::Attribute(attr_type) => {
                let mut attr = Attribute::new(attr_type, AttributeFlags::computed());
                if let Some(description) = &property.description {
                    attr = attr.with_description(description.clone());
                }
                block = block.with_attribute(name.clone(), attr);
            },
            Field::Block(nested) => block = block.with_block(name.clone(), nested),
        }
    }
    Ok(block)
}

/// Translate one property schema.
pub fn translate_schema(
    swagger: &Swagger,
    schema: &SchemaObject,
    visited: &mut Vec<String>,
) -> Result<Field, ProviderError> {
    if let Some(reference) = &schema.reference {
        let (name, target) = swagger.resolve_ref(reference)?;
        if DYNAMIC_DEFINITIONS.contains(&name) || visited.iter().any(|v| v == name) {
            return Ok(Field::Attribute(AttributeType::Dynamic));
        }
        visited.push(name.to_string());
        let field = translate_schema(swagger, target, visited);
        visited.pop();
        return field;
    }

    let field = match schema.kind.as_deref() {
        Some("string") => Field::Attribute(AttributeType::String),
        Some("integer") => Field::Attribute(AttributeType::Int64),
        Some("number") => Field::Attribute(AttributeType::Float64),
        Some("boolean") => Field::Attribute(AttributeType::Bool),
        Some("array") => match &schema.items {
            Some(items) => match translate_schema(swagger, items, visited)? {
                Field::Attribute(element) => Field::Attribute(AttributeType::list(element)),
                Field::Block(nested) => Field::Block(NestedBlock::list(nested.block)),
            },
            None => Field::Attribute(AttributeType::list(AttributeType::Dynamic)),
        },
        Some("object") | None if !schema.properties.is_empty() => Field::Block(
            NestedBlock::list(translate_object(swagger, schema, visited)?).with_max_items(1),
        ),
        Some("object") => match &schema.additional_properties {
            Some(AdditionalProperties::Schema(element)) => {
                match translate_schema(swagger, element, visited)? {
                    Field::Attribute(element) => Field::Attribute(AttributeType::map(element)),
                    Field::Block(_) => Field::Attribute(AttributeType::map(AttributeType::Dynamic)),
                }
            },
            _ => Field::Attribute(AttributeType::Dynamic),
        },
        _ => Field::Attribute(AttributeType::Dynamic),
    };
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BlockNestingMode;

    fn swagger(definitions: &str) -> Swagger {
        Swagger::from_json(&format!(r#"{{"definitions": {}}}"#, definitions)).unwrap()
    }

    fn schema(json: &str) -> SchemaObject {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_scalars() {
        let doc = Swagger::default();
        for (json, expected) in [
            (r#"{"type": "string", "format": "date-time"}"#, AttributeType::String),
            (r#"{"type": "integer", "format": "int64"}"#, AttributeType::Int64),
            (r#"{"type": "number"}"#, AttributeType::Float64),
            (r#"{"type": "boolean"}"#, AttributeType::Bool),
            (r#"{"type": "object"}"#, AttributeType::Dynamic),
        ] {
            assert_eq!(
                translate_schema(&doc, &schema(json), &mut vec![]).unwrap(),
                Field::Attribute(expected)
            );
        }
    }

    #[test]
    fn test_arrays_and_maps() {
        let doc = swagger(r#"{"google.protobuf.ListValue": {"type": "array"}}"#);

        let tags = schema(r#"{"type": "array", "items": {"type": "string"}}"#);
        assert_eq!(
            translate_schema(&doc, &tags, &mut vec![]).unwrap(),
            Field::Attribute(AttributeType::list(AttributeType::String))
        );

        let actions = schema(
            r##"{"type": "object", "additionalProperties": {"$ref": "#/definitions/google.protobuf.ListValue"}}"##,
        );
        assert_eq!(
            translate_schema(&doc, &actions, &mut vec![]).unwrap(),
            Field::Attribute(AttributeType::map(AttributeType::Dynamic))
        );
    }

    #[test]
    fn test_nested_objects_become_blocks() {
        let doc = swagger(
            r#"{"Account": {"type": "object", "properties": {"id": {"type": "string"}}}}"#,
        );

        let accounts = schema(r##"{"type": "array", "items": {"$ref": "#/definitions/Account"}}"##);
        match translate_schema(&doc, &accounts, &mut vec![]).unwrap() {
            Field::Block(nested) => {
                assert_eq!(nested.nesting_mode, BlockNestingMode::List);
                assert_eq!(nested.max_items, 0);
                assert!(nested.block.attributes["id"].flags.is_computed_only());
            },
            other => panic!("expected block, got {:?}", other),
        }

        let scope = schema(r##"{"$ref": "#/definitions/Account"}"##);
        match translate_schema(&doc, &scope, &mut vec![]).unwrap() {
            Field::Block(nested) => assert_eq!(nested.max_items, 1),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_cycle_becomes_dynamic() {
        let doc = swagger(
            r##"{"Node": {"type": "object", "properties": {
                "name": {"type": "string"},
                "parent": {"$ref": "#/definitions/Node"}
            }}}"##,
        );
        let root = schema(r##"{"$ref": "#/definitions/Node"}"##);
        let Field::Block(nested) = translate_schema(&doc, &root, &mut vec![]).unwrap() else {
            panic!("expected block");
        };
        assert_eq!(nested.block.attributes["parent"].attr_type, AttributeType::Dynamic);
        assert_eq!(nested.block.attributes["name"].attr_type, AttributeType::String);
    }

    #[test]
    fn test_unknown_reference_is_error() {
        let doc = Swagger::default();
        let missing = schema(r##"{"$ref": "#/definitions/Missing"}"##);
        assert!(translate_schema(&doc, &missing, &mut vec![]).is_err());
    }

    #[test]
    fn test_target_parsing() {
        let target: DataSourceTarget = "boundary_scopes=/v1/scopes".parse().unwrap();
        assert_eq!(target.path, "/v1/scopes");
        assert!("boundary_scopes".parse::<DataSourceTarget>().is_err());
        assert!("=/v1/scopes".parse::<DataSourceTarget>().is_err());
        assert_eq!(default_targets().len(), 4);
    }
}
