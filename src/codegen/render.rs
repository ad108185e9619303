//! Render data source specs to Rust source with tera.

use serde::Serialize;
use tera::{Context, Tera};

use super::translate::{DataSourceSpec, QueryParamKind};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Block, BlockNestingMode};

const DATA_SOURCE_TEMPLATE_NAME: &str = "data_source.rs.tera";
const MOD_TEMPLATE_NAME: &str = "mod.rs.tera";

const DATA_SOURCE_TEMPLATE: &str = r#"// Code generated by boundary-provider generate. DO NOT EDIT.
// Source: {{ operation_id }} (GET {{ path }})

use crate::datasources::{ListDataSource, QueryParam};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};

pub const DATA_SOURCE: ListDataSource = ListDataSource {
    name: "{{ name }}",
    collection: "{{ collection }}",
    query: &[
{%- for param in query %}
        QueryParam::{{ param.kind }}("{{ param.name }}"),
{%- endfor %}
    ],
    schema,
};

/// Schema for `{{ name }}`. Items follow `{{ item_definition }}`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description({{ description }})
        .with_attribute("id", Attribute::computed_string())
{%- for param in query %}
        .with_attribute("{{ param.name }}", {{ param.attribute }})
{%- endfor %}
        .with_block(
            "items",
            NestedBlock::list(
                {{ items }}
            ),
        )
}
"#;

const MOD_TEMPLATE: &str = r#"// Code generated by boundary-provider generate. DO NOT EDIT.

use super::ListDataSource;

{% for module in modules -%}
mod {{ module }};
{% endfor %}
/// Every generated data source, sorted by name.
pub const ALL: &[ListDataSource] = &[
{%- for module in modules %}
    {{ module }}::DATA_SOURCE,
{%- endfor %}
];
"#;

#[derive(Debug, Serialize)]
struct QueryParamView {
    name: String,
    kind: QueryParamKind,
    attribute: String,
}

#[derive(Debug, Serialize)]
struct DataSourceView<'a> {
    name: &'a str,
    path: &'a str,
    collection: &'a str,
    operation_id: &'a str,
    item_definition: &'a str,
    description: String,
    query: Vec<QueryParamView>,
    items: String,
}

/// Template engine holding the generator templates.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, ProviderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(vec![
            (DATA_SOURCE_TEMPLATE_NAME, DATA_SOURCE_TEMPLATE),
            (MOD_TEMPLATE_NAME, MOD_TEMPLATE),
        ])
        .map_err(template_error)?;
        Ok(Self { tera })
    }

    /// Render the source file for one data source.
    pub fn data_source(&self, spec: &DataSourceSpec) -> Result<String, ProviderError> {
        let view = DataSourceView {
            name: &spec.name,
            path: &spec.path,
            collection: &spec.collection,
            operation_id: &spec.operation_id,
            item_definition: &spec.item_definition,
            description: format!("{:?}", spec.description),
            query: spec
                .query
                .iter()
                .map(|param| QueryParamView {
                    name: param.name.clone(),
                    kind: param.kind,
                    attribute: query_attribute_expr(param.kind, param.description.as_deref()),
                })
                .collect(),
            items: block_expr(&spec.item_block, 16)?,
        };
        self.render(DATA_SOURCE_TEMPLATE_NAME, &view)
    }

    /// Render the `mod.rs` registering `modules`.
    pub fn module_index(&self, modules: &[String]) -> Result<String, ProviderError> {
        let mut modules = modules.to_vec();
        modules.sort();
        modules.dedup();
        let mut context = Context::new();
        context.insert("modules", &modules);
        self.tera
            .render(MOD_TEMPLATE_NAME, &context)
            .map_err(template_error)
    }

    fn render<T: Serialize>(&self, template: &str, view: &T) -> Result<String, ProviderError> {
        let context = Context::from_serialize(view).map_err(template_error)?;
        self.tera.render(template, &context).map_err(template_error)
    }
}

fn template_error(err: tera::Error) -> ProviderError {
    // tera nests the useful message in the source chain
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ProviderError::Codegen(message)
}

fn query_attribute_expr(kind: QueryParamKind, description: Option<&str>) -> String {
    let base = match kind {
        QueryParamKind::String => "Attribute::optional_string()",
        QueryParamKind::Bool => "Attribute::optional_bool()",
        QueryParamKind::Int => "Attribute::optional_int64()",
    };
    match description {
        Some(description) => format!("{}.with_description({:?})", base, description),
        None => base.to_string(),
    }
}

fn type_expr(attr_type: &AttributeType) -> Result<String, ProviderError> {
    Ok(match attr_type {
        AttributeType::String => "AttributeType::String".to_string(),
        AttributeType::Int64 => "AttributeType::Int64".to_string(),
        AttributeType::Float64 => "AttributeType::Float64".to_string(),
        AttributeType::Bool => "AttributeType::Bool".to_string(),
        AttributeType::Dynamic => "AttributeType::Dynamic".to_string(),
        AttributeType::List(element) => format!("AttributeType::list({})", type_expr(element)?),
        AttributeType::Set(element) => format!("AttributeType::set({})", type_expr(element)?),
        AttributeType::Map(element) => format!("AttributeType::map({})", type_expr(element)?),
        AttributeType::Object(_) => {
            return Err(ProviderError::Codegen(
                "object attribute types cannot be rendered".to_string(),
            ))
        },
    })
}

fn attribute_expr(attr: &Attribute) -> Result<String, ProviderError> {
    let mut expr = format!(
        "Attribute::new({}, AttributeFlags::computed())",
        type_expr(&attr.attr_type)?
    );
    if let Some(description) = &attr.description {
        expr.push_str(&format!(".with_description({:?})", description));
    }
    Ok(expr)
}

/// Render a block builder chain whose first line starts at column `indent`.
fn block_expr(block: &Block, indent: usize) -> Result<String, ProviderError> {
    let pad = " ".repeat(indent + 4);
    let mut out = String::from("Block::new()");

    for (name, attr) in &block.attributes {
        out.push_str(&format!("\n{}.with_attribute({:?}, {})", pad, name, attribute_expr(attr)?));
    }

    for (name, nested) in &block.blocks {
        let mode = match nested.nesting_mode {
            BlockNestingMode::Single => "single",
            BlockNestingMode::List => "list",
            BlockNestingMode::Set => "set",
            BlockNestingMode::Map => "map",
        };
        let max_items = if nested.max_items > 0 {
            format!("\n{}    .with_max_items({})", pad, nested.max_items)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "\n{pad}.with_block(\n{pad}    {name:?},\n{pad}    NestedBlock::{mode}(\n{pad}        {inner}\n{pad}    ){max_items},\n{pad})",
            pad = pad,
            name = name,
            mode = mode,
            inner = block_expr(&nested.block, indent + 12)?,
            max_items = max_items,
        ));
    }

    Ok(out)
}
