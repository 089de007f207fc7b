//! Directory-backed YAML catalog: one `{version}.yaml` per tree version.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::parse_definition;
use crate::domain::foundation::TreeVersion;
use crate::domain::tree::TreeDefinition;
use crate::ports::{LoaderError, TreeCatalogLoader};

#[derive(Debug, Clone)]
pub struct YamlCatalogLoader {
    directory: PathBuf,
}

impl YamlCatalogLoader {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// `None` for version ids that are not plain file stems.
    fn file_for(&self, version: &TreeVersion) -> Option<PathBuf> {
        let id = version.as_str();
        let plain = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.starts_with('.');
        plain.then(|| self.directory.join(format!("{id}.yaml")))
    }
}

#[async_trait]
impl TreeCatalogLoader for YamlCatalogLoader {
    async fn load(&self, version: &TreeVersion) -> Result<TreeDefinition, LoaderError> {
        let path = self
            .file_for(version)
            .ok_or_else(|| LoaderError::NotFound(version.clone()))?;
        let yaml = match fs::read_to_string(&path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoaderError::NotFound(version.clone()))
            }
            Err(e) => return Err(LoaderError::Io(format!("{}: {}", path.display(), e))),
        };
        tracing::debug!(path = %path.display(), "catalog file read");
        parse_definition(version, &yaml)
    }

    async fn available_versions(&self) -> Result<Vec<TreeVersion>, LoaderError> {
        let mut entries = fs::read_dir(&self.directory)
            .await
            .map_err(|e| LoaderError::Io(format!("{}: {}", self.directory.display(), e)))?;

        let mut versions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LoaderError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(version) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| TreeVersion::new(s).ok())
            {
                versions.push(version);
            }
        }
        versions.sort();
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BUILTIN: &str = include_str!("dbt-v1.yaml");

    async fn catalog_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("dbt-v1.yaml"), BUILTIN).await.unwrap();
        fs::write(
            dir.path().join("dbt-v2.yaml"),
            BUILTIN.replacen("version: dbt-v1", "version: dbt-v2", 1),
        )
        .await
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();
        dir
    }

    #[tokio::test]
    async fn lists_yaml_versions_sorted() {
        let dir = catalog_dir().await;
        let loader = YamlCatalogLoader::new(dir.path());
        let versions: Vec<String> = loader
            .available_versions()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(versions, vec!["dbt-v1", "dbt-v2"]);
    }

    #[tokio::test]
    async fn loads_a_version() {
        let dir = catalog_dir().await;
        let loader = YamlCatalogLoader::new(dir.path());
        let def = loader.load(&TreeVersion::new("dbt-v2").unwrap()).await.unwrap();
        assert_eq!(def.version.as_str(), "dbt-v2");
    }

    #[tokio::test]
    async fn mismatched_declared_version_is_rejected() {
        let dir = catalog_dir().await;
        fs::write(dir.path().join("dbt-v3.yaml"), BUILTIN).await.unwrap();
        let loader = YamlCatalogLoader::new(dir.path());
        assert!(matches!(
            loader.load(&TreeVersion::new("dbt-v3").unwrap()).await,
            Err(LoaderError::VersionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn unparseable_file_is_a_parse_error() {
        let dir = catalog_dir().await;
        fs::write(dir.path().join("broken.yaml"), "nodes: [").await.unwrap();
        let loader = YamlCatalogLoader::new(dir.path());
        assert!(matches!(
            loader.load(&TreeVersion::new("broken").unwrap()).await,
            Err(LoaderError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn path_like_versions_are_not_found() {
        let dir = catalog_dir().await;
        let loader = YamlCatalogLoader::new(dir.path());
        assert!(matches!(
            loader.load(&TreeVersion::new("../dbt-v1").unwrap()).await,
            Err(LoaderError::NotFound(_))
        ));
    }
}
