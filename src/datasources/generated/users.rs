// Code generated by boundary-provider generate. DO NOT EDIT.
// Source: UserService_ListUsers (GET /v1/users)

use crate::datasources::{ListDataSource, QueryParam};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};

pub const DATA_SOURCE: ListDataSource = ListDataSource {
    name: "boundary_users",
    collection: "users",
    query: &[
        QueryParam::string("filter"),
        QueryParam::bool("recursive"),
        QueryParam::string("scope_id"),
    ],
    schema,
};

/// Schema for `boundary_users`. Items follow `controller.api.resources.users.v1.User`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Lists all Users.")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("filter", Attribute::optional_string())
        .with_attribute("recursive", Attribute::optional_bool())
        .with_attribute("scope_id", Attribute::optional_string())
        .with_block(
            "items",
            NestedBlock::list(
                Block::new()
                    .with_attribute("account_ids", Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::computed()))
                    .with_attribute("authorized_actions", Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::computed()))
                    .with_attribute("created_time", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("description", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("email", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("full_name", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("id", Attribute::new(AttributeType::String, AttributeFlags::computed()).with_description("Output only. The ID of the User."))
                    .with_attribute("login_name", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("name", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("primary_account_id", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("scope_id", Attribute::new(AttributeType::String, AttributeFlags::computed()).with_description("The ID of the Scope this resource is in."))
                    .with_attribute("updated_time", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                    .with_attribute("version", Attribute::new(AttributeType::Int64, AttributeFlags::computed()))
                    .with_block(
                        "accounts",
                        NestedBlock::list(
                            Block::new()
                                .with_attribute("id", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                                .with_attribute("scope_id", Attribute::new(AttributeType::String, AttributeFlags::computed()))
                        ),
                    )
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
