// Code generated by boundary-provider generate. DO NOT EDIT.
// Source: ScopeService_ListScopes (GET /v1/scopes)

use crate::datasources::{ListDataSource, QueryParam};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};

pub const DATA_SOURCE: ListDataSource = ListDataSource {
    name: "boundary_scopes",
    collection: "scopes",
    query: &[
        QueryParam::string("filter"),
        QueryParam::bool("recursive"),
        QueryParam::string("scope_id"),
    ],
    schema,
};

/// Schema for `boundary_scopes`. Items follow `controller.api.resources.scopes.v1.Scope`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Lists all Scopes within the Scope provided in the request.")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("filter", Attribute::optional_string())
        .with_attribute("recursive", Attribute::optional_bool())
        .with_attribute("scope_id", Attribute::optional_string())
        .with_block(
            "items",
            NestedBlock::list(
                Block::new()
                    .with_attribute("authorized_actions", Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::computed()))
                    .with_attribute("authorized_collection_actions", Attribute::new(AttributeType::map(AttributeType::Dynamic), AttributeFlags::computed()))
                    .with_attribute("created_time", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("description", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("id", Attribute::new(AttributeType::String, AttributeFlags::computed()).with_description("Output only. The ID of the Scope."))
                    .with_attribute("name", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("primary_auth_method_id", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("scope_id", Attribute::new(AttributeType::String, AttributeFlags::computed()).with_description("The ID of the Scope this resource is in."))
                    .with_attribute("type", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("updated_time", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("version", Attribute::new(AttributeType::Int64, AttributeFlags::computed()))
                    .with_block(
                        "scope",
                        NestedBlock::list(
                            Block::new()
                                .with_attribute("description", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                                .with_attribute("id", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                                .with_attribute("name", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                                .with_attribute("parent_scope_id", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                                .with_attribute("type", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                        )
                        .with_max_items(1),
                    )
            ),
        )
}
