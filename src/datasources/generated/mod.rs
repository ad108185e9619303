// Code generated by boundary-provider generate. DO NOT EDIT.

use super::ListDataSource;

mod auth_methods;
mod groups;
mod scopes;
mod users;

/// Every generated data source, sorted by name.
pub const ALL: &[ListDataSource] = &[
    auth_methods::DATA_SOURCE,
    groups::DATA_SOURCE,
    scopes::DATA_SOURCE,
    users::DATA_SOURCE,
];
