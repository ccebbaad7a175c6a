//! # Instantiation Engine
//!
//! Builds the services of one resolved module.
//!
//! Declarative modules are built in two passes over the flat names:
//!
//! 1. every leaf is loaded and, under the singleton policy, constructed
//!    eagerly in discovery order. Pending constructions are collected but
//!    never block the iteration;
//! 2. after all pending constructions settled (all-or-nothing), every
//!    namespace node is reassembled from its already-built descendants. The
//!    discovery order guarantees children come before their namespace.
//!
//! Imperative modules hand control to their setup entry point and return
//! whatever it produces.
use futures::future::try_join_all;

use crate::plugin_system::error::{PluginSystemError, Result};
use crate::plugin_system::loader::ModuleLoader;
use crate::plugin_system::manifest::{InstantiationPolicy, ModuleConfig};
use crate::plugin_system::normalizer::{FlatName, ProvidedService, SEPARATOR};
use crate::plugin_system::registry::{ImportMap, ServiceEntry, ServiceMap, ServiceNamespace};
use crate::plugin_system::traits::{Construction, SetupOutcome};

/// Registry slot while the module is being built.
enum Slot {
    Built(ServiceEntry),
    Pending,
    Namespace,
}

/// Instantiate every service `config` provides.
///
/// `default_policy` applies unless the module sets `instantiateBeforeInjection`.
pub async fn instantiate(
    config: &ModuleConfig,
    imports: &ImportMap,
    loader: &dyn ModuleLoader,
    default_policy: InstantiationPolicy,
) -> Result<ServiceMap> {
    if let Some(location) = &config.setup {
        if config.provides_is_json {
            return Err(PluginSystemError::configuration(
                config.name(),
                "module declares both a setup entry point and a mapping of provided services",
            ));
        }
        log::debug!("Running setup entry point of '{}' at {}", config.name(), location.display());
        let setup = loader.load_setup(location)?;
        let outcome = setup
            .setup(config, imports)
            .map_err(|e| as_construction_error(&config.name(), e))?;
        return match outcome {
            SetupOutcome::Ready(services) => Ok(services),
            SetupOutcome::Pending(future) => future
                .await
                .map_err(|e| as_construction_error(&config.name(), e)),
        };
    }

    if !config.provides_is_json {
        if config.provides.is_empty() {
            return Ok(ServiceMap::new());
        }
        return Err(PluginSystemError::configuration(
            config.name(),
            format!(
                "module lists provided services ({}) but has no setup entry point to register them",
                config.provides.join(", ")
            ),
        ));
    }

    let policy = config.policy(default_policy);
    log::debug!("Instantiating '{}' with {:?} policy", config.name(), policy);
    instantiate_declared(config, imports, loader, policy).await
}

async fn instantiate_declared(
    config: &ModuleConfig,
    imports: &ImportMap,
    loader: &dyn ModuleLoader,
    policy: InstantiationPolicy,
) -> Result<ServiceMap> {
    let mut slots: Vec<(FlatName, Slot)> = Vec::with_capacity(config.provides.len());
    let mut pending = Vec::new();

    // Pass 1: leaves, in discovery order
    for name in &config.provides {
        match config.enhancers.get(name) {
            Some(ProvidedService::Location(location)) => {
                let factory = loader.load(location)?;
                match policy {
                    InstantiationPolicy::Factory => {
                        log::debug!("'{}' registered as factory", name);
                        slots.push((name.clone(), Slot::Built(ServiceEntry::Factory(factory))));
                    }
                    InstantiationPolicy::Singleton => {
                        let construction = factory
                            .construct(config, imports)
                            .map_err(|e| as_construction_error(name, e))?;
                        match construction {
                            Construction::Ready(instance) => {
                                log::debug!("'{}' constructed", name);
                                slots.push((name.clone(), Slot::Built(ServiceEntry::Instance(instance))));
                            }
                            Construction::Pending(future) => {
                                log::debug!("'{}' construction pending", name);
                                pending.push((slots.len(), name.clone(), future));
                                slots.push((name.clone(), Slot::Pending));
                            }
                        }
                    }
                }
            }
            Some(ProvidedService::Namespace(_)) => slots.push((name.clone(), Slot::Namespace)),
            None => {
                return Err(PluginSystemError::configuration(
                    config.name(),
                    format!("service '{}' is listed in provides but never declared", name),
                ));
            }
        }
    }

    // Join: all pending constructions settle together or the module fails
    if !pending.is_empty() {
        log::debug!(
            "Waiting for {} pending construction(s) in '{}'",
            pending.len(),
            config.name()
        );
        let settled = try_join_all(pending.into_iter().map(|(position, name, future)| async move {
            match future.await {
                Ok(instance) => Ok((position, instance)),
                Err(e) => Err(as_construction_error(&name, e)),
            }
        }))
        .await?;
        for (position, instance) in settled {
            slots[position].1 = Slot::Built(ServiceEntry::Instance(instance));
        }
    }

    // Pass 2: namespaces, rebuilt from their already-built descendants
    for position in 0..slots.len() {
        if !matches!(slots[position].1, Slot::Namespace) {
            continue;
        }
        let prefix = format!("{}{}", slots[position].0, SEPARATOR);
        let mut namespace = ServiceNamespace::new();
        for (name, slot) in &slots {
            if let (Some(relative), Slot::Built(entry)) = (name.strip_prefix(&prefix), slot) {
                namespace.push(relative.to_string(), entry.clone());
            }
        }
        slots[position].1 = Slot::Built(ServiceEntry::Namespace(namespace));
    }

    let mut services = ServiceMap::new();
    for (name, slot) in slots {
        match slot {
            Slot::Built(entry) => services.insert(name, entry),
            Slot::Pending | Slot::Namespace => {
                return Err(PluginSystemError::construction(
                    name,
                    "service was never settled",
                ));
            }
        }
    }

    log::info!("Module '{}' instantiated {} service(s)", config.name(), services.len());
    Ok(services)
}

fn as_construction_error(service: &str, error: PluginSystemError) -> PluginSystemError {
    if error.is_construction() {
        error
    } else {
        PluginSystemError::ConstructionError {
            service: service.to_string(),
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}
