use std::path::Path;

use async_trait::async_trait;

use crate::plugin_system::engine;
use crate::plugin_system::error::Result;
use crate::plugin_system::loader::ModuleLoader;
use crate::plugin_system::manifest::{InstantiationPolicy, ModuleConfig, ModuleManifest};
use crate::plugin_system::registry::{ImportMap, ServiceMap};

/// Capability interface every module wrapper implements.
///
/// `resolve_config` runs once when the module is registered; `setup_plugin`
/// runs when the application is assembled. Wrappers that need extra behaviour
/// hold an inner enhancer and delegate to it rather than re-implementing it.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Policy applied when the module does not override it.
    fn default_policy(&self) -> InstantiationPolicy {
        InstantiationPolicy::Singleton
    }

    /// Validate and normalize a manifest into a module config.
    fn resolve_config(&self, manifest: ModuleManifest, base: &Path) -> Result<ModuleConfig>;

    /// Build the module's services, given the services it imports.
    async fn setup_plugin(
        &self,
        config: &ModuleConfig,
        imports: ImportMap,
        loader: &dyn ModuleLoader,
    ) -> Result<ServiceMap>;
}

/// The plain enhancer: normalizes declarations and instantiates them.
#[derive(Debug, Clone, Default)]
pub struct BaseEnhancer {
    policy: InstantiationPolicy,
}

impl BaseEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// An enhancer whose modules default to `policy`, e.g.
    /// [`InstantiationPolicy::Factory`] for schema-like services that consumers
    /// instantiate many times.
    pub fn with_policy(policy: InstantiationPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Enhancer for BaseEnhancer {
    fn name(&self) -> &str {
        "base"
    }

    fn default_policy(&self) -> InstantiationPolicy {
        self.policy
    }

    fn resolve_config(&self, manifest: ModuleManifest, base: &Path) -> Result<ModuleConfig> {
        log::debug!("{}: resolving module {:?}", self.name(), manifest.package_path);
        ModuleConfig::resolve(manifest, base)
    }

    async fn setup_plugin(
        &self,
        config: &ModuleConfig,
        imports: ImportMap,
        loader: &dyn ModuleLoader,
    ) -> Result<ServiceMap> {
        log::debug!("{}: setting up '{}'", self.name(), config.name());
        engine::instantiate(config, &imports, loader, self.default_policy()).await
    }
}
