//! Tree catalog loaders.
//!
//! - `BuiltinCatalogLoader` - the `dbt-v1` catalog compiled into the binary
//! - `YamlCatalogLoader` - `{dir}/{version}.yaml` files on disk

mod builtin;
mod yaml_loader;

pub use builtin::{BuiltinCatalogLoader, BUILTIN_VERSION};
pub use yaml_loader::YamlCatalogLoader;

use crate::domain::foundation::TreeVersion;
use crate::domain::tree::TreeDefinition;
use crate::ports::LoaderError;

/// Parses a catalog document and checks it declares the requested version.
fn parse_definition(requested: &TreeVersion, yaml: &str) -> Result<TreeDefinition, LoaderError> {
    let definition: TreeDefinition =
        serde_yaml::from_str(yaml).map_err(|e| LoaderError::Parse {
            version: requested.to_string(),
            message: e.to_string(),
        })?;
    if &definition.version != requested {
        return Err(LoaderError::VersionMismatch {
            requested: requested.clone(),
            found: definition.version,
        });
    }
    Ok(definition)
}
