//! Command handlers for the `archie` binary.
use std::error::Error;
use std::path::{Path, PathBuf};

use archie_core::plugin_system::{BaseEnhancer, Enhancer, ModuleConfig, ProvidesMap};
use archie_core::read_manifest;
use serde::Serialize;

pub type CommandResult = Result<String, Box<dyn Error + Send + Sync>>;

/// The parts of a resolved module that `normalize` prints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedView<'a> {
    provides: &'a [String],
    enhancers: &'a ProvidesMap,
    consumes: &'a [String],
    provides_is_json: bool,
}

async fn resolve(manifest: &Path, base: Option<&Path>) -> Result<ModuleConfig, Box<dyn Error + Send + Sync>> {
    let base = match base {
        Some(base) => base.to_path_buf(),
        None => match manifest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    log::debug!("Resolving {} against {}", manifest.display(), base.display());

    let raw = read_manifest(manifest).await?;
    Ok(BaseEnhancer::new().resolve_config(raw, &base)?)
}

pub async fn normalize(manifest: &Path, base: Option<&Path>) -> CommandResult {
    let config = resolve(manifest, base).await?;
    let view = NormalizedView {
        provides: &config.provides,
        enhancers: &config.enhancers,
        consumes: &config.consumes,
        provides_is_json: config.provides_is_json,
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

pub async fn check(manifest: &Path, base: Option<&Path>) -> CommandResult {
    let config = resolve(manifest, base).await?;
    Ok(format!("ok: {} services", config.provides.len()))
}
