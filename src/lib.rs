//! Boundary provider
//!
//! A provider plugin that manages [Boundary](https://www.boundaryproject.io/)
//! infrastructure: host catalogs, hosts, host sets, roles and workers, plus
//! list data sources generated from the controller's Swagger document.
//!
//! The host spawns the `boundary-provider` binary, reads the handshake line
//! from stdout and talks gRPC to the advertised address:
//!
//! ```text
//! BOUNDARY_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Each gRPC call lands in [`ProviderService`], implemented by
//! [`BoundaryProvider`], which plans changes from the resource schemas and
//! turns CRUD calls into requests against the controller's `/v1/` API.
//!
//! # Layout
//!
//! - [`client`]: HTTP client for the controller API
//! - [`resources`]: one handler per managed resource type
//! - [`datasources`]: list data sources, generated by [`codegen`]
//! - [`provider`]: configuration, planning and dispatch
//! - [`server`]: the gRPC server and handshake
//! - [`testing`]: a harness that drives a provider without gRPC
//!
//! ```ignore
//! use boundary_provider::{serve, BoundaryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     boundary_provider::init_logging("info");
//!     serve(BoundaryProvider::new()).await
//! }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod codegen;
pub mod config;
pub mod datasources;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use client::BoundaryClient;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, try_init_logging};
pub use provider::BoundaryProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

pub use async_trait::async_trait;
pub use serde_json;
