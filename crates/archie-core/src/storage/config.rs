use std::path::Path;

use serde::de::DeserializeOwned;

use crate::plugin_system::manifest::ModuleManifest;
use crate::storage::error::StorageSystemError;

/// Encodings a module manifest may be written in.
///
/// JSON is always available; YAML and TOML follow the `yaml-config` and
/// `toml-config` features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    #[cfg(feature = "yaml-config")]
    Yaml,
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ManifestFormat {
    /// Short name used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "json",
            #[cfg(feature = "yaml-config")]
            Self::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            Self::Toml => "toml",
        }
    }

    /// Pick the format from the file extension, ignoring case.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Some(Self::Yaml),
            #[cfg(feature = "toml-config")]
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, content: &str) -> Result<T, StorageSystemError> {
        let decoded = match self {
            Self::Json => serde_json::from_str(content).map_err(boxed),
            #[cfg(feature = "yaml-config")]
            Self::Yaml => serde_yaml::from_str(content).map_err(boxed),
            #[cfg(feature = "toml-config")]
            Self::Toml => toml::from_str(content).map_err(boxed),
        };
        decoded.map_err(|source| StorageSystemError::Parse { format: self.label(), source })
    }
}

fn boxed<E>(error: E) -> Box<dyn std::error::Error + Send + Sync>
where
    E: std::error::Error + Send + Sync + 'static,
{
    Box::new(error)
}

/// Parse a module manifest held in memory.
pub fn parse_manifest(content: &str, format: ManifestFormat) -> Result<ModuleManifest, StorageSystemError> {
    format.decode(content)
}

/// Read the module manifest at `path`.
pub async fn read_manifest(path: &Path) -> Result<ModuleManifest, StorageSystemError> {
    let format = ManifestFormat::detect(path)
        .ok_or_else(|| StorageSystemError::UnsupportedFormat(path.to_path_buf()))?;

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StorageSystemError::read(path, e))?;

    log::debug!("Parsing {} manifest {}", format.label(), path.display());
    parse_manifest(&content, format)
}
