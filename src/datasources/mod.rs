//! Read-only list data sources.
//!
//! The per-collection definitions under [`generated`] are produced by
//! `boundary-provider generate` from the controller's Swagger document. This
//! module holds the runtime that turns a definition into a list request and
//! shapes the response into state.

pub mod generated;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::BoundaryClient;
use crate::error::ProviderError;
use crate::schema::{Block, BlockNestingMode, Schema};

/// The wire type of a list query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    String,
    Bool,
    Int,
}

/// A query parameter of a list operation, exposed as an optional input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParam {
    pub name: &'static str,
    pub kind: QueryKind,
}

impl QueryParam {
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: QueryKind::String,
        }
    }

    pub const fn bool(name: &'static str) -> Self {
        Self {
            name,
            kind: QueryKind::Bool,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: QueryKind::Int,
        }
    }

    /// Render a configured value as a query string value.
    fn render(&self, value: &Value) -> Option<String> {
        match (self.kind, value) {
            (_, Value::Null) => None,
            (QueryKind::String, Value::String(s)) => Some(s.clone()),
            (QueryKind::Bool, Value::Bool(b)) => Some(b.to_string()),
            (QueryKind::Int, Value::Number(n)) => Some(n.to_string()),
            (_, other) => Some(other.to_string()),
        }
    }
}

/// A data source that lists one controller collection.
#[derive(Debug, Clone, Copy)]
pub struct ListDataSource {
    /// Data source type name, e.g. `boundary_scopes`.
    pub name: &'static str,
    /// Collection path below `/v1/`, e.g. `scopes`.
    pub collection: &'static str,
    /// Query parameters accepted by the list operation.
    pub query: &'static [QueryParam],
    /// Builds the data source schema. The `items` block describes one element.
    pub schema: fn() -> Schema,
}

impl ListDataSource {
    /// List the collection and return the data source state.
    pub async fn read(&self, client: &BoundaryClient, config: Value) -> Result<Value, ProviderError> {
        let config = match config {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ProviderError::InvalidRequest(format!(
                    "{} configuration must be an object, got {}",
                    self.name, other
                )))
            },
        };

        let query: Vec<(String, String)> = self
            .query
            .iter()
            .filter_map(|param| {
                let value = config.get(param.name)?;
                param.render(value).map(|v| (param.name.to_string(), v))
            })
            .collect();
        debug!(data_source = self.name, params = query.len(), "Listing collection");

        let schema = (self.schema)();
        let items = client.list(self.collection, &query).await?;
        info!(data_source = self.name, items = items.len(), "Read data source");

        let item_block = schema
            .block
            .blocks
            .get("items")
            .map(|nested| &nested.block);
        let items: Vec<Value> = match item_block {
            Some(block) => items.into_iter().map(|item| project(block, item)).collect(),
            None => items,
        };

        let mut state = Map::new();
        for param in self.query {
            state.insert(
                param.name.to_string(),
                config.get(param.name).cloned().unwrap_or(Value::Null),
            );
        }
        state.insert("id".to_string(), Value::from(self.collection));
        state.insert("items".to_string(), Value::Array(items));
        Ok(Value::Object(state))
    }
}

/// Keep only what `block` declares. Nested objects become single-element
/// lists so they match their list-block schema.
fn project(block: &Block, value: Value) -> Value {
    let mut source = match value {
        Value::Object(map) => map,
        _ => return Value::Null,
    };

    let mut out = Map::new();
    for name in block.attributes.keys() {
        out.insert(name.clone(), source.remove(name).unwrap_or(Value::Null));
    }
    for (name, nested) in &block.blocks {
        let projected = match (nested.nesting_mode, source.remove(name)) {
            (_, None) | (_, Some(Value::Null)) => Value::Array(vec![]),
            (BlockNestingMode::Map, Some(Value::Object(map))) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, project(&nested.block, item)))
                    .collect(),
            ),
            (_, Some(Value::Array(items))) => Value::Array(
                items
                    .into_iter()
                    .map(|item| project(&nested.block, item))
                    .collect(),
            ),
            (_, Some(single)) => Value::Array(vec![project(&nested.block, single)]),
        };
        out.insert(name.clone(), projected);
    }
    Value::Object(out)
}

/// Every generated data source.
pub fn all() -> &'static [ListDataSource] {
    generated::ALL
}

/// Look up a data source by type name.
pub fn find(name: &str) -> Option<&'static ListDataSource> {
    all().iter().find(|ds| ds.name == name)
}
