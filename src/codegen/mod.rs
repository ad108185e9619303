//! Data source generator.
//!
//! Reads the controller's Swagger document, translates the item definition
//! of each list operation into a schema, and renders one Rust module per
//! data source plus a `mod.rs` registering them.

mod render;
mod swagger;
mod translate;

pub use render::Renderer;
pub use swagger::{AdditionalProperties, Operation, Parameter, PathItem, SchemaObject, Swagger};
pub use translate::{
    default_targets, translate_object, translate_schema, DataSourceSpec, DataSourceTarget, Field,
    QueryParamKind, QueryParamSpec,
};

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ProviderError;

/// Generate data source modules for `targets` into `out_dir`.
///
/// Returns the written paths, data sources first and `mod.rs` last.
pub fn generate(
    swagger: &Swagger,
    targets: &[DataSourceTarget],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ProviderError> {
    if targets.is_empty() {
        return Err(ProviderError::Codegen("no data sources requested".to_string()));
    }

    let renderer = Renderer::new()?;
    let mut specs = targets
        .iter()
        .map(|target| DataSourceSpec::from_swagger(swagger, target))
        .collect::<Result<Vec<_>, _>>()?;
    specs.sort_by(|a, b| a.module.cmp(&b.module));
    if let Some(pair) = specs.windows(2).find(|pair| pair[0].module == pair[1].module) {
        return Err(ProviderError::Codegen(format!(
            "{} and {} would both be written to {}.rs",
            pair[0].name, pair[1].name, pair[0].module
        )));
    }

    std::fs::create_dir_all(out_dir).map_err(|e| io_error(out_dir, e))?;

    let mut written = Vec::with_capacity(specs.len() + 1);
    for spec in &specs {
        let path = out_dir.join(format!("{}.rs", spec.module));
        write(&path, &renderer.data_source(spec)?)?;
        info!(data_source = %spec.name, path = %path.display(), "Generated data source");
        written.push(path);
    }

    let modules: Vec<String> = specs.iter().map(|spec| spec.module.clone()).collect();
    let index = out_dir.join("mod.rs");
    write(&index, &renderer.module_index(&modules)?)?;
    written.push(index);

    Ok(written)
}

fn write(path: &Path, contents: &str) -> Result<(), ProviderError> {
    std::fs::write(path, contents).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> ProviderError {
    ProviderError::Codegen(format!("writing {}: {}", path.display(), err))
}
