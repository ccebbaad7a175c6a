//! # Declaration Normalizer
//!
//! Flattens a nested [`ServiceDeclaration`] into the canonical form the
//! instantiation engine consumes:
//!
//! - an ordered list of fully-qualified [`FlatName`]s, in discovery order
//!   (a namespace's children are listed before the namespace itself),
//! - a [`ProvidesMap`] from each flat name to either the absolute location of
//!   a leaf or the (location-resolved) sub-declaration of a namespace.
//!
//! Normalization is pure: the input declaration is never modified, and calling
//! [`normalize`] twice on the same input yields identical results.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::plugin_system::declaration::ServiceDeclaration;
use crate::plugin_system::error::{PluginSystemError, Result};
use crate::utils::path::resolve_location;

/// Separator between the keys of a fully-qualified service name.
pub const SEPARATOR: char = '.';

/// Dot-joined, fully-qualified service path such as `db.models.user`.
pub type FlatName = String;

/// What a flat name stands for once normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvidedService {
    /// Absolute location of a leaf service.
    Location(PathBuf),
    /// A namespace node, summarized by its sub-declaration with absolute leaves.
    Namespace(ServiceDeclaration),
}

impl ProvidedService {
    pub fn is_leaf(&self) -> bool {
        matches!(self, ProvidedService::Location(_))
    }

    pub fn location(&self) -> Option<&Path> {
        match self {
            ProvidedService::Location(location) => Some(location),
            ProvidedService::Namespace(_) => None,
        }
    }
}

impl Serialize for ProvidedService {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ProvidedService::Location(location) => {
                serializer.serialize_str(&location.to_string_lossy())
            }
            ProvidedService::Namespace(declaration) => declaration.serialize(serializer),
        }
    }
}

/// Flat name to provided service, iterated in insertion (discovery) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidesMap {
    entries: Vec<(FlatName, ProvidedService)>,
    index: HashMap<FlatName, usize>,
}

impl ProvidesMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry. Flat names are unique; a second insert of the same
    /// name is rejected instead of overwriting the first.
    pub fn insert(&mut self, name: FlatName, service: ProvidedService) -> Result<()> {
        if self.index.contains_key(&name) {
            return Err(PluginSystemError::DuplicateService { name });
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, service));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ProvidedService> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlatName, &ProvidedService)> {
        self.entries.iter().map(|(name, service)| (name, service))
    }
}

impl Serialize for ProvidesMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, service) in &self.entries {
            map.serialize_entry(name, service)?;
        }
        map.end()
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Every node's flat name, children before their namespace.
    pub provides: Vec<FlatName>,
    /// Flat name to resolved location or namespace summary.
    pub providers: ProvidesMap,
    /// The input tree with every leaf replaced by its absolute location.
    pub resolved: ServiceDeclaration,
}

/// Flatten `declaration` and resolve every leaf against `base` and `package_path`.
///
/// Leaves resolve like ordinary paths: relative leaves are relative to the
/// package directory, which is itself relative to `base`; absolute segments
/// replace whatever precedes them.
pub fn normalize(
    declaration: &ServiceDeclaration,
    package_path: &Path,
    base: &Path,
) -> Result<Normalized> {
    let module = package_path.display().to_string();
    if base.as_os_str().is_empty() {
        return Err(PluginSystemError::configuration(
            module,
            "base should be provided to resolve service locations",
        ));
    }
    if package_path.as_os_str().is_empty() {
        return Err(PluginSystemError::configuration(
            "<unknown>",
            "packagePath missing in module",
        ));
    }

    let entries = match declaration {
        ServiceDeclaration::Namespace(entries) => entries,
        ServiceDeclaration::Leaf(location) => {
            return Err(PluginSystemError::configuration(
                module,
                format!("provides must be a mapping to be normalized, found location '{}'", location),
            ));
        }
    };

    let mut flattener = Flattener {
        module: &module,
        package_path,
        base,
        provides: Vec::with_capacity(declaration.descendant_count()),
        providers: ProvidesMap::new(),
    };
    let resolved_entries = flattener.flatten(entries, "")?;

    log::debug!(
        "Normalized module '{}': {} services declared",
        module,
        flattener.provides.len()
    );

    Ok(Normalized {
        provides: flattener.provides,
        providers: flattener.providers,
        resolved: ServiceDeclaration::Namespace(resolved_entries),
    })
}

/// Reject keys that would make flat names ambiguous.
pub fn validate_key(module: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(PluginSystemError::configuration(
            module,
            "service keys must not be empty",
        ));
    }
    if key.contains(SEPARATOR) {
        return Err(PluginSystemError::configuration(
            module,
            format!(
                "service key '{}' contains the namespace separator '{}'; nest it instead",
                key, SEPARATOR
            ),
        ));
    }
    Ok(())
}

/// Absolute location of `location`, relative to `package_path` under `base`.
pub(crate) fn resolve_leaf(module: &str, base: &Path, package_path: &Path, location: &str) -> Result<PathBuf> {
    resolve_location([base, package_path, Path::new(location)]).map_err(|e| {
        PluginSystemError::configuration(
            module,
            format!("cannot resolve '{}' against the working directory: {}", location, e),
        )
    })
}

struct Flattener<'a> {
    module: &'a str,
    package_path: &'a Path,
    base: &'a Path,
    provides: Vec<FlatName>,
    providers: ProvidesMap,
}

impl Flattener<'_> {
    fn flatten(
        &mut self,
        entries: &[(String, ServiceDeclaration)],
        prefix: &str,
    ) -> Result<Vec<(String, ServiceDeclaration)>> {
        let mut resolved_entries = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            validate_key(self.module, key)?;
            let flat_name = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, SEPARATOR, key)
            };

            match value {
                ServiceDeclaration::Namespace(children) => {
                    // Children first, so they are registered before their parent
                    let resolved_children = self.flatten(children, &flat_name)?;
                    let resolved = ServiceDeclaration::Namespace(resolved_children);
                    self.providers
                        .insert(flat_name.clone(), ProvidedService::Namespace(resolved.clone()))?;
                    resolved_entries.push((key.clone(), resolved));
                }
                ServiceDeclaration::Leaf(location) => {
                    if location.is_empty() {
                        return Err(PluginSystemError::configuration(
                            self.module,
                            format!("service '{}' declares an empty location", flat_name),
                        ));
                    }
                    let resolved = resolve_leaf(self.module, self.base, self.package_path, location)?;
                    log::trace!("'{}' -> {}", flat_name, resolved.display());
                    let as_string = resolved.to_string_lossy().into_owned();
                    self.providers
                        .insert(flat_name.clone(), ProvidedService::Location(resolved))?;
                    resolved_entries.push((key.clone(), ServiceDeclaration::Leaf(as_string)));
                }
            }

            self.provides.push(flat_name);
        }

        Ok(resolved_entries)
    }
}
