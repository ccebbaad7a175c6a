use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plugin_system::declaration::ServiceDeclaration;
use crate::plugin_system::error::{PluginSystemError, Result};
use crate::plugin_system::normalizer::{self, FlatName, ProvidesMap};

const PACKAGING_ERROR_TEMPLATE: &str = "a setup entry point cannot be combined with a mapping \
of provided services. Rename or remove the setup entry point of module '{module}' so it is \
clear how the module should be loaded.";

/// Whether leaf services are built before they are injected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstantiationPolicy {
    /// Construct every leaf once and inject the instance.
    #[default]
    Singleton,
    /// Inject the factory; consumers construct as many instances as they need.
    Factory,
}

impl InstantiationPolicy {
    pub fn from_instantiate_before_injection(instantiate: bool) -> Self {
        if instantiate {
            InstantiationPolicy::Singleton
        } else {
            InstantiationPolicy::Factory
        }
    }

    pub fn instantiates_before_injection(&self) -> bool {
        matches!(self, InstantiationPolicy::Singleton)
    }
}

/// A string-or-list field; both spellings mean a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(single) => vec![single],
            OneOrMany::Many(list) => list,
        }
    }
}

/// The two mutually exclusive ways a module can declare what it provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Provides {
    /// Service names registered by an imperative setup entry point.
    Names(OneOrMany),
    /// A (possibly nested) mapping of service keys to locations.
    Tree(ServiceDeclaration),
}

/// A module manifest as authored, before resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    #[serde(default)]
    pub package_path: Option<String>,
    #[serde(default)]
    pub consumes: Option<OneOrMany>,
    #[serde(default)]
    pub provides: Option<Provides>,
    /// Location of an imperative setup entry point.
    #[serde(default)]
    pub setup: Option<String>,
    #[serde(default)]
    pub instantiate_before_injection: Option<bool>,
    /// Every other key, kept for enhancers that read their own settings.
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// A resolved module: created once by an enhancer's `resolve_config`,
/// read by the instantiation engine, never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub package_path: PathBuf,
    pub consumes: Vec<String>,
    /// Flat names in discovery order.
    pub provides: Vec<FlatName>,
    /// Flat name to location or namespace; empty for imperative modules.
    pub enhancers: ProvidesMap,
    pub provides_is_json: bool,
    /// The provides mapping with absolute leaf locations, if declarative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<ServiceDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instantiate_before_injection: Option<bool>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}

impl ModuleConfig {
    /// Validate and normalize `manifest`, resolving locations against `base`.
    pub fn resolve(manifest: ModuleManifest, base: &Path) -> Result<Self> {
        let package = manifest.package_path.clone().unwrap_or_default();
        if base.as_os_str().is_empty() {
            return Err(PluginSystemError::configuration(
                package,
                "base should be provided to resolve service locations",
            ));
        }
        if package.is_empty() {
            return Err(PluginSystemError::configuration(
                "<unknown>",
                "packagePath missing in module",
            ));
        }
        let package_path = PathBuf::from(&package);

        let consumes = manifest.consumes.map(OneOrMany::into_vec).unwrap_or_default();
        let setup = manifest
            .setup
            .as_deref()
            .map(|location| normalizer::resolve_leaf(&package, base, &package_path, location))
            .transpose()?;

        let mut config = ModuleConfig {
            package_path,
            consumes,
            provides: Vec::new(),
            enhancers: ProvidesMap::new(),
            provides_is_json: false,
            declaration: None,
            setup,
            instantiate_before_injection: manifest.instantiate_before_injection,
            settings: manifest.settings,
        };

        match manifest.provides {
            None => {}
            Some(Provides::Names(names)) => {
                // Imperative style: nothing to flatten
                config.provides = names.into_vec();
            }
            Some(Provides::Tree(declaration)) => {
                if config.setup.is_some() {
                    return Err(PluginSystemError::configuration(
                        &package,
                        PACKAGING_ERROR_TEMPLATE.replace("{module}", &package),
                    ));
                }
                let normalized = normalizer::normalize(&declaration, &config.package_path, base)?;
                config.provides = normalized.provides;
                config.enhancers = normalized.providers;
                config.declaration = Some(normalized.resolved);
                config.provides_is_json = true;
            }
        }

        Ok(config)
    }

    /// Display name used in diagnostics.
    pub fn name(&self) -> String {
        self.package_path.display().to_string()
    }

    /// The module's own override, or `default` when it has none.
    pub fn policy(&self, default: InstantiationPolicy) -> InstantiationPolicy {
        self.instantiate_before_injection
            .map(InstantiationPolicy::from_instantiate_before_injection)
            .unwrap_or(default)
    }

    /// Read a module-specific setting; `None` when the module does not set it.
    pub fn setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.settings.get(key) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            PluginSystemError::configuration(self.name(), format!("invalid setting '{}': {}", key, e))
        })
    }
}

/// Builder for creating a module manifest in code
pub struct ManifestBuilder {
    manifest: ModuleManifest,
}

impl ManifestBuilder {
    pub fn new(package_path: &str) -> Self {
        Self {
            manifest: ModuleManifest {
                package_path: Some(package_path.to_string()),
                ..ModuleManifest::default()
            },
        }
    }

    /// Declare the provided services as a mapping.
    pub fn provides(mut self, declaration: ServiceDeclaration) -> Self {
        self.manifest.provides = Some(Provides::Tree(declaration));
        self
    }

    /// Declare the names an imperative setup entry point registers.
    pub fn provides_names(mut self, names: &[&str]) -> Self {
        let names = names.iter().map(|name| name.to_string()).collect();
        self.manifest.provides = Some(Provides::Names(OneOrMany::Many(names)));
        self
    }

    pub fn consumes(mut self, service: &str) -> Self {
        let mut consumes = self
            .manifest
            .consumes
            .take()
            .map(OneOrMany::into_vec)
            .unwrap_or_default();
        consumes.push(service.to_string());
        self.manifest.consumes = Some(OneOrMany::Many(consumes));
        self
    }

    pub fn setup(mut self, location: &str) -> Self {
        self.manifest.setup = Some(location.to_string());
        self
    }

    pub fn instantiate_before_injection(mut self, instantiate: bool) -> Self {
        self.manifest.instantiate_before_injection = Some(instantiate);
        self
    }

    pub fn setting(mut self, key: &str, value: Value) -> Self {
        self.manifest.settings.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> ModuleManifest {
        self.manifest
    }
}
