#![cfg(test)]

use std::path::Path;

use crate::plugin_system::declaration::ServiceDeclaration;
use crate::plugin_system::enhancer::{BaseEnhancer, Enhancer};
use crate::plugin_system::error::Result;
use crate::plugin_system::loader::StaticModuleLoader;
use crate::plugin_system::manifest::{InstantiationPolicy, ManifestBuilder, ModuleConfig};
use crate::plugin_system::registry::{ImportMap, ServiceEntry};
use crate::plugin_system::traits::Construction;

fn counter_factory(_: &ModuleConfig, _: &ImportMap) -> Result<Construction> {
    Ok(Construction::ready(0_u64))
}

fn manifest() -> crate::plugin_system::manifest::ModuleManifest {
    ManifestBuilder::new("counters")
        .provides(ServiceDeclaration::namespace([("count", ServiceDeclaration::leaf("count.js"))]))
        .build()
}

fn loader() -> StaticModuleLoader {
    StaticModuleLoader::new().with_factory("/app/counters/count.js", counter_factory)
}

#[test]
fn test_base_enhancer_defaults() {
    let enhancer = BaseEnhancer::new();
    assert_eq!(enhancer.name(), "base");
    assert_eq!(enhancer.default_policy(), InstantiationPolicy::Singleton);

    let factories = BaseEnhancer::with_policy(InstantiationPolicy::Factory);
    assert_eq!(factories.default_policy(), InstantiationPolicy::Factory);
}

#[test]
fn test_resolve_config_normalizes() -> Result<()> {
    let config = BaseEnhancer::new().resolve_config(manifest(), Path::new("/app"))?;
    assert_eq!(config.provides, vec!["count"]);
    assert!(config.provides_is_json);
    Ok(())
}

#[tokio::test]
async fn test_setup_plugin_uses_enhancer_default_policy() -> Result<()> {
    let enhancer = BaseEnhancer::with_policy(InstantiationPolicy::Factory);
    let config = enhancer.resolve_config(manifest(), Path::new("/app"))?;

    let services = enhancer.setup_plugin(&config, ImportMap::new(), &loader()).await?;
    assert!(services.get("count").and_then(ServiceEntry::as_factory).is_some());
    Ok(())
}

#[tokio::test]
async fn test_module_override_beats_enhancer_default() -> Result<()> {
    let enhancer = BaseEnhancer::with_policy(InstantiationPolicy::Factory);
    let mut manifest = manifest();
    manifest.instantiate_before_injection = Some(true);
    let config = enhancer.resolve_config(manifest, Path::new("/app"))?;

    let services = enhancer.setup_plugin(&config, ImportMap::new(), &loader()).await?;
    assert_eq!(services.get_instance::<u64>("count").as_deref(), Some(&0));
    Ok(())
}

#[tokio::test]
async fn test_enhancer_as_trait_object() -> Result<()> {
    let enhancer: Box<dyn Enhancer> = Box::new(BaseEnhancer::new());
    let config = enhancer.resolve_config(manifest(), Path::new("/app"))?;
    let services = enhancer.setup_plugin(&config, ImportMap::new(), &loader()).await?;
    assert_eq!(services.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_chained_modules_feed_imports() -> Result<()> {
    // The output of one module becomes the imports of the next
    let enhancer = BaseEnhancer::new();
    let first = enhancer.resolve_config(manifest(), Path::new("/app"))?;
    let produced = enhancer.setup_plugin(&first, ImportMap::new(), &loader()).await?;

    let mut imports = ImportMap::new();
    imports.extend_from(&produced);

    let consumer = enhancer.resolve_config(
        ManifestBuilder::new("reporter")
            .consumes("count")
            .provides(ServiceDeclaration::namespace([("report", ServiceDeclaration::leaf("report.js"))]))
            .build(),
        Path::new("/app"),
    )?;
    let loader = StaticModuleLoader::new().with_factory(
        "/app/reporter/report.js",
        |_: &ModuleConfig, imports: &ImportMap| -> Result<Construction> {
            let count = imports.get_instance::<u64>("count").map(|c| *c).unwrap_or(u64::MAX);
            Ok(Construction::ready(format!("count = {}", count)))
        },
    );

    let services = enhancer.setup_plugin(&consumer, imports, &loader).await?;
    assert_eq!(services.get_instance::<String>("report").as_deref().map(String::as_str), Some("count = 0"));
    Ok(())
}
